//! Durable storage seam for state machine instances.
//!
//! The engine owns no storage of its own; it talks to a [`BasketStore`]
//! through optimistic compare-and-swap. A commit persists the new
//! instance and its audit record in one unit of work, both-or-neither,
//! so no partial state is ever observable.

mod memory;

pub use memory::MemoryStore;

use crate::audit::TransitionRecord;
use crate::catalog::BasketState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

/// Durable per-entity record of the state machine.
///
/// Created implicitly on the first transition attempt for an unseen
/// entity; mutated only by a successful commit; never physically
/// deleted, even in terminal states.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct StateMachineInstance {
    pub entity_id: Uuid,
    pub current_state: BasketState,
    /// Optimistic concurrency token, bumped on every commit.
    pub version: u64,
    /// Number of accepted transitions.
    pub transition_count: u64,
    /// Listing retry counter, managed by the engine.
    pub retry_count: u32,
    /// Distinct approvers recorded for the current approval round.
    /// Guard context, deliberately not a lifecycle state.
    pub approvals: BTreeSet<String>,
    pub last_transition_at: DateTime<Utc>,
}

impl StateMachineInstance {
    /// The implicit record for an entity that has never transitioned.
    pub fn fresh(entity_id: Uuid) -> Self {
        Self {
            entity_id,
            current_state: BasketState::Draft,
            version: 0,
            transition_count: 0,
            retry_count: 0,
            approvals: BTreeSet::new(),
            last_transition_at: Utc::now(),
        }
    }
}

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent writer committed first. The engine reloads and
    /// re-evaluates; this is not a guard failure.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// The durable store is unreachable or rejected the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage contract consumed by the engine.
///
/// Implementations must provide read-your-writes consistency within a
/// single store instance. All writers go through [`commit`]'s
/// compare-and-swap; there is no blind overwrite path.
///
/// [`commit`]: BasketStore::commit
#[async_trait]
pub trait BasketStore: Send + Sync {
    /// Load the instance, or the implicit `Draft`/version-0 record if
    /// the entity has never been seen.
    async fn load(&self, entity_id: Uuid) -> Result<StateMachineInstance, StoreError>;

    /// Compare-and-swap commit: succeeds only if the stored version
    /// still equals `expected_version`, then persists `instance`
    /// (already carrying the bumped version) together with its audit
    /// record atomically.
    async fn commit(
        &self,
        instance: StateMachineInstance,
        expected_version: u64,
        record: TransitionRecord,
    ) -> Result<(), StoreError>;

    /// Append the audit record for a rejected attempt. Rejections
    /// change no instance state and need no version check.
    async fn append_rejection(&self, record: TransitionRecord) -> Result<(), StoreError>;

    /// The full ordered audit trail for an entity. Empty if unseen.
    async fn audit_trail(&self, entity_id: Uuid) -> Result<Vec<TransitionRecord>, StoreError>;
}
