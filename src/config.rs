//! Engine configuration.
//!
//! Read once at startup and treated as immutable for the process
//! lifetime, matching the table and guard registries.

use serde::{Deserialize, Serialize};

/// How many distinct approvers a basket needs before it moves to
/// `Approved`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ApprovalMode {
    /// One approver is sufficient.
    #[default]
    Single,
    /// Two distinct approvers must each issue `ApproveBasket`. Partial
    /// approval is tracked as guard context on the instance record, not
    /// as an extra lifecycle state.
    Dual,
}

/// Tunables for the lifecycle engine.
///
/// # Example
///
/// ```rust
/// use basketflow::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.max_retries, 3);
/// assert_eq!(config.commit_attempts, 4);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Listing retry budget enforced by the `RetryLimit` guard.
    pub max_retries: u32,
    /// How many times a `send_event` call re-runs the load/guard/commit
    /// cycle after a version conflict before giving up with `Busy`.
    pub commit_attempts: u32,
    /// Approval workflow shape.
    pub approval_mode: ApprovalMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            commit_attempts: 4,
            approval_mode: ApprovalMode::Single,
        }
    }
}
