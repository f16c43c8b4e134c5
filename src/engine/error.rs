//! Engine-level failures.
//!
//! Workflow rejections (terminal state, illegal pair, guard denial) are
//! not errors: they come back as `TransitionResult` values with reason
//! codes, already audited. Only contention overruns and store outages
//! surface here.

use crate::store::StoreError;
use thiserror::Error;

/// Failures of a `send_event` call itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Version-conflict contention exceeded the configured retry
    /// budget. Retry with backoff; the request was never dropped
    /// silently.
    #[error("Entity busy: {attempts} commit attempts all conflicted")]
    Busy { attempts: u32 },

    /// The durable store failed. No partial state was committed, but no
    /// audit record exists either: the outcome is unknown until the
    /// caller re-queries `current_state`.
    #[error("Persistence failure: {0}")]
    Persistence(#[source] StoreError),
}
