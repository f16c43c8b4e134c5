//! In-process store for tests and single-node deployments.

use super::{BasketStore, StateMachineInstance, StoreError};
use crate::audit::TransitionRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct EntityRow {
    instance: Option<StateMachineInstance>,
    trail: Vec<TransitionRecord>,
}

/// Hash-map backed [`BasketStore`].
///
/// A single `RwLock` over the row map keeps commit atomic: the version
/// check, the instance write and the audit append happen under one
/// write guard, so readers never observe a half-applied commit.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<Uuid, EntityRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BasketStore for MemoryStore {
    async fn load(&self, entity_id: Uuid) -> Result<StateMachineInstance, StoreError> {
        let rows = self.rows.read();
        Ok(rows
            .get(&entity_id)
            .and_then(|row| row.instance.clone())
            .unwrap_or_else(|| StateMachineInstance::fresh(entity_id)))
    }

    async fn commit(
        &self,
        instance: StateMachineInstance,
        expected_version: u64,
        record: TransitionRecord,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        let row = rows.entry(instance.entity_id).or_default();
        let actual = row.instance.as_ref().map(|i| i.version).unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual,
            });
        }
        row.instance = Some(instance);
        row.trail.push(record);
        Ok(())
    }

    async fn append_rejection(&self, record: TransitionRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        rows.entry(record.entity_id).or_default().trail.push(record);
        Ok(())
    }

    async fn audit_trail(&self, entity_id: Uuid) -> Result<Vec<TransitionRecord>, StoreError> {
        let rows = self.rows.read();
        Ok(rows.get(&entity_id).map(|row| row.trail.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TransitionOutcome;
    use crate::catalog::{BasketState, LifecycleEvent};
    use chrono::Utc;

    fn accepted_record(entity_id: Uuid, count: u64) -> TransitionRecord {
        TransitionRecord {
            entity_id,
            from_state: BasketState::Draft,
            to_state: Some(BasketState::Backtesting),
            event: LifecycleEvent::TriggerBacktest,
            actor: "alice".into(),
            timestamp: Utc::now(),
            outcome: TransitionOutcome::Accepted,
            reason: None,
            guard_context: String::new(),
            transition_count: count,
        }
    }

    #[tokio::test]
    async fn load_of_unseen_entity_is_fresh_draft() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let instance = store.load(id).await.unwrap();
        assert_eq!(instance.current_state, BasketState::Draft);
        assert_eq!(instance.version, 0);
        assert_eq!(instance.transition_count, 0);
    }

    #[tokio::test]
    async fn commit_persists_instance_and_record_together() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let mut instance = StateMachineInstance::fresh(id);
        instance.current_state = BasketState::Backtesting;
        instance.version = 1;
        instance.transition_count = 1;

        store.commit(instance.clone(), 0, accepted_record(id, 1)).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), instance);
        assert_eq!(store.audit_trail(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commit_with_stale_version_conflicts() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let mut instance = StateMachineInstance::fresh(id);
        instance.version = 1;
        store.commit(instance.clone(), 0, accepted_record(id, 1)).await.unwrap();

        // Second writer still believes version 0.
        let result = store.commit(instance, 0, accepted_record(id, 1)).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected: 0, actual: 1 })
        ));
        assert_eq!(store.audit_trail(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejections_append_without_touching_state() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let mut record = accepted_record(id, 0);
        record.outcome = TransitionOutcome::Rejected;
        record.to_state = None;

        store.append_rejection(record).await.unwrap();

        assert_eq!(store.load(id).await.unwrap().version, 0);
        assert_eq!(store.audit_trail(id).await.unwrap().len(), 1);
    }
}
