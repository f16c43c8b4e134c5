//! Guard predicates controlling whether a declared transition may fire.
//!
//! Guards are pure functions over a [`GuardContext`] plus read-only
//! engine configuration. They never mutate anything and never perform
//! I/O: any external data a guard needs (roles, backtest results,
//! content snapshots) must be pre-fetched into the context by the
//! caller before the engine is invoked.

mod context;
mod rules;

pub use context::{BacktestOutcome, BasketSnapshot, Constituent, GuardContext, Principal, Role};
pub use rules::evaluate;

use serde::{Deserialize, Serialize};

/// Identifier of a guard predicate, referenced by transition rules.
///
/// The mapping from id to predicate is fixed at compile time in
/// [`evaluate`]; there is no runtime registry to misconfigure.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GuardId {
    /// Always allows. Used by system-reported outcomes.
    None,
    /// Basket contents pass structural validation.
    BasketValid,
    /// A completed backtest exists and met the minimum thresholds.
    BacktestValid,
    /// Principal holds the approver role; enforces the dual-approval
    /// quorum when configured.
    ApproverAuth,
    /// Principal holds the admin role.
    AdminAuth,
    /// Principal is the original submitter.
    OwnerAuth,
    /// The retry budget has not been exhausted.
    RetryLimit,
}

impl GuardId {
    /// Stable identifier for logging and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::BasketValid => "BasketValid",
            Self::BacktestValid => "BacktestValid",
            Self::ApproverAuth => "ApproverAuth",
            Self::AdminAuth => "AdminAuth",
            Self::OwnerAuth => "OwnerAuth",
            Self::RetryLimit => "RetryLimit",
        }
    }
}

/// Why a transition attempt was turned down.
///
/// Reason codes are surfaced verbatim to callers and written into the
/// audit trail, so rejections stay reconstructable after the fact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ReasonCode {
    /// The entity is already in a terminal state.
    TerminalState,
    /// No rule exists for the `(state, event)` pair.
    InvalidTransition,
    /// `retry_count` reached the configured maximum.
    RetryLimitExceeded,
    /// Principal lacks the role the guard requires.
    Unauthorized,
    /// Principal is not the original submitter.
    NotOwner,
    /// Basket contents failed structural validation.
    BasketNotValid,
    /// No passing backtest result is attached to the context.
    BacktestNotValid,
    /// Dual-approval workflow: the first approval was recorded, a second
    /// distinct approver is still required.
    ApprovalQuorumPending,
    /// Dual-approval workflow: this principal already approved.
    DuplicateApproval,
}

impl ReasonCode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TerminalState => "TerminalState",
            Self::InvalidTransition => "InvalidTransition",
            Self::RetryLimitExceeded => "RetryLimitExceeded",
            Self::Unauthorized => "Unauthorized",
            Self::NotOwner => "NotOwner",
            Self::BasketNotValid => "BasketNotValid",
            Self::BacktestNotValid => "BacktestNotValid",
            Self::ApprovalQuorumPending => "ApprovalQuorumPending",
            Self::DuplicateApproval => "DuplicateApproval",
        }
    }
}

/// Verdict of a guard evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GuardOutcome {
    Allow,
    Deny(ReasonCode),
}

impl GuardOutcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}
