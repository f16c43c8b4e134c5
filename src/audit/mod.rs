//! Append-only audit trail of transition attempts.
//!
//! Every call into the engine produces exactly one [`TransitionRecord`],
//! accepted or rejected. The trail is the compliance artifact of the
//! system: replaying its accepted records through the transition table
//! reproduces the entity's current state exactly.

use crate::catalog::{BasketState, LifecycleEvent};
use crate::guard::ReasonCode;
use crate::table::TransitionTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a transition attempt committed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TransitionOutcome {
    Accepted,
    Rejected,
}

/// One audit entry.
///
/// Records are immutable once appended. A rejected attempt carries
/// `to_state: None` and the reason code; an accepted one carries the
/// committed target state and the post-commit `transition_count`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub entity_id: Uuid,
    pub from_state: BasketState,
    pub to_state: Option<BasketState>,
    pub event: LifecycleEvent,
    /// Principal id of the caller.
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: TransitionOutcome,
    pub reason: Option<ReasonCode>,
    /// JSON snapshot of the guard-relevant context (payload, retry
    /// count, partial approvals) for after-the-fact diagnosis. Kept as
    /// text so records survive both JSON and binary archive formats.
    pub guard_context: String,
    /// `transition_count` of the instance after this record. For a
    /// rejection this repeats the unchanged counter.
    pub transition_count: u64,
}

impl TransitionRecord {
    pub fn is_accepted(&self) -> bool {
        self.outcome == TransitionOutcome::Accepted
    }
}

/// Fold the accepted records of a trail through the transition table.
///
/// Rejected records are skipped; accepted records whose `(state, event)`
/// pair no longer resolves (a table changed between runs) leave the
/// state untouched rather than inventing an illegal move.
///
/// # Example
///
/// ```rust
/// use basketflow::audit::replay;
/// use basketflow::catalog::BasketState;
/// use basketflow::table::lifecycle_table;
///
/// let table = lifecycle_table();
/// let state = replay(BasketState::Draft, &[], &table);
/// assert_eq!(state, BasketState::Draft);
/// ```
pub fn replay(
    initial: BasketState,
    trail: &[TransitionRecord],
    table: &TransitionTable,
) -> BasketState {
    trail
        .iter()
        .filter(|record| record.is_accepted())
        .fold(initial, |state, record| {
            table
                .resolve(state, record.event)
                .map(|rule| rule.target)
                .unwrap_or(state)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::lifecycle_table;

    fn record(
        entity_id: Uuid,
        from: BasketState,
        to: Option<BasketState>,
        event: LifecycleEvent,
        outcome: TransitionOutcome,
    ) -> TransitionRecord {
        TransitionRecord {
            entity_id,
            from_state: from,
            to_state: to,
            event,
            actor: "alice".into(),
            timestamp: Utc::now(),
            outcome,
            reason: None,
            guard_context: String::new(),
            transition_count: 0,
        }
    }

    #[test]
    fn replay_of_empty_trail_is_initial_state() {
        let table = lifecycle_table();
        assert_eq!(replay(BasketState::Draft, &[], &table), BasketState::Draft);
    }

    #[test]
    fn replay_follows_accepted_records() {
        let table = lifecycle_table();
        let id = Uuid::new_v4();
        let trail = vec![
            record(
                id,
                BasketState::Draft,
                Some(BasketState::Backtesting),
                LifecycleEvent::TriggerBacktest,
                TransitionOutcome::Accepted,
            ),
            record(
                id,
                BasketState::Backtesting,
                Some(BasketState::Backtested),
                LifecycleEvent::BacktestCompleted,
                TransitionOutcome::Accepted,
            ),
        ];
        assert_eq!(replay(BasketState::Draft, &trail, &table), BasketState::Backtested);
    }

    #[test]
    fn replay_skips_rejected_records() {
        let table = lifecycle_table();
        let id = Uuid::new_v4();
        let trail = vec![
            record(
                id,
                BasketState::Draft,
                None,
                LifecycleEvent::ApproveBasket,
                TransitionOutcome::Rejected,
            ),
            record(
                id,
                BasketState::Draft,
                Some(BasketState::Backtesting),
                LifecycleEvent::TriggerBacktest,
                TransitionOutcome::Accepted,
            ),
        ];
        assert_eq!(replay(BasketState::Draft, &trail, &table), BasketState::Backtesting);
    }

    #[test]
    fn record_serializes_roundtrip() {
        let original = record(
            Uuid::new_v4(),
            BasketState::Draft,
            Some(BasketState::Backtesting),
            LifecycleEvent::TriggerBacktest,
            TransitionOutcome::Accepted,
        );
        let json = serde_json::to_string(&original).unwrap();
        let back: TransitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
