//! Side-effect dispatch after a committed transition.
//!
//! Actions run strictly after the state commit, on their own tokio
//! task, never under the entity lock. A failed action never rolls back
//! a committed transition: the failure is logged and left to the
//! publisher's out-of-band retry. Because delivery is at-least-once,
//! dispatch dedupes on `(entity_id, transition_count)` so redelivered
//! actions are idempotent.

use crate::audit::TransitionRecord;
use async_trait::async_trait;
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifier of a post-commit side effect, referenced by transition
/// rules.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ActionId {
    /// No side effect.
    None,
    /// Publish a plain status-changed lifecycle event.
    PublishStatusChanged,
    /// Kick the downstream backtest workflow.
    StartBacktest,
    /// Notify approvers that a basket awaits review.
    NotifyApprovers,
    /// Kick the downstream vendor-listing workflow.
    StartListing,
    /// Publish a trading-halt notification (suspension, delisting,
    /// listing failure).
    PublishLifecycleHalt,
}

impl ActionId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::PublishStatusChanged => "PublishStatusChanged",
            Self::StartBacktest => "StartBacktest",
            Self::NotifyApprovers => "NotifyApprovers",
            Self::StartListing => "StartListing",
            Self::PublishLifecycleHalt => "PublishLifecycleHalt",
        }
    }

    /// Topic the action publishes to. `None` for [`ActionId::None`].
    pub fn topic(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::PublishStatusChanged => Some("basket.lifecycle.status"),
            Self::StartBacktest => Some("basket.workflow.backtest"),
            Self::NotifyApprovers => Some("basket.workflow.approval"),
            Self::StartListing => Some("basket.workflow.listing"),
            Self::PublishLifecycleHalt => Some("basket.lifecycle.halt"),
        }
    }
}

/// Publish failure, logged and retried out-of-band by the publisher.
#[derive(Debug, Error)]
#[error("Publish to '{topic}' failed: {message}")]
pub struct PublishError {
    pub topic: String,
    pub message: String,
}

/// Downstream event/notification publisher.
///
/// Delivery semantics are at-least-once; the engine depends on neither
/// ordering nor exactly-once delivery from this collaborator.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &'static str,
        entity_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<(), PublishError>;
}

/// Publisher that only logs. Useful for development and as the default
/// wiring in tests that do not assert on side effects.
#[derive(Default)]
pub struct LoggingPublisher;

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(
        &self,
        topic: &'static str,
        entity_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        info!(%entity_id, topic, %payload, "lifecycle event published");
        Ok(())
    }
}

/// Dispatches rule actions onto detached tokio tasks.
pub struct ActionExecutor {
    publisher: Arc<dyn EventPublisher>,
    /// `(entity_id, transition_count)` pairs already dispatched.
    seen: DashSet<(Uuid, u64)>,
}

impl ActionExecutor {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            publisher,
            seen: DashSet::new(),
        }
    }

    /// Dispatch the action for a committed transition, fire-and-forget.
    ///
    /// Returns the spawned task handle so tests can await completion;
    /// production callers drop it. Returns `None` when there is nothing
    /// to do: the rule carries no action, or this `(entity_id,
    /// transition_count)` pair was already dispatched.
    pub fn dispatch(&self, action: ActionId, record: &TransitionRecord) -> Option<JoinHandle<()>> {
        let topic = action.topic()?;
        if !self.seen.insert((record.entity_id, record.transition_count)) {
            debug!(
                entity_id = %record.entity_id,
                transition_count = record.transition_count,
                action = action.name(),
                "duplicate action delivery suppressed"
            );
            return None;
        }

        let publisher = Arc::clone(&self.publisher);
        let entity_id = record.entity_id;
        let payload = serde_json::json!({
            "event": record.event.name(),
            "from": record.from_state.name(),
            "to": record.to_state.map(|s| s.name()),
            "actor": record.actor,
            "transition_count": record.transition_count,
            "at": record.timestamp,
        });

        Some(tokio::spawn(async move {
            if let Err(err) = publisher.publish(topic, entity_id, payload).await {
                // The transition is already committed; never propagated.
                warn!(%entity_id, topic, error = %err, "action dispatch failed");
            }
        }))
    }

    /// Drop the dedupe entries for an entity that can no longer
    /// transition, so the set stays bounded by the live population.
    pub fn forget(&self, entity_id: Uuid) {
        self.seen.retain(|(id, _)| *id != entity_id);
    }
}
