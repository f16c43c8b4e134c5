//! The instance manager: per-entity serialization, guard evaluation,
//! optimistic commit and audit on every path.
//!
//! `send_event` is synchronous from the caller's point of view: it
//! returns only once the transition is committed or rejected. Entities
//! never share a lock, so unrelated baskets proceed fully in parallel;
//! attempts on the same basket are strictly serialized in lock
//! acquisition order. The entity lock is held for load-guard-commit
//! only, never across action dispatch.

mod error;

pub use error::EngineError;

use crate::action::{ActionExecutor, EventPublisher};
use crate::audit::{TransitionOutcome, TransitionRecord};
use crate::catalog::{BasketState, LifecycleEvent};
use crate::config::EngineConfig;
use crate::guard::{self, GuardContext, GuardOutcome, ReasonCode};
use crate::store::{BasketStore, StateMachineInstance, StoreError};
use crate::table::{lifecycle_table, TransitionTable};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of a `send_event` call that reached a decision.
///
/// Rejections are ordinary outcomes, not errors: they are audited and
/// carry the reason code for the caller to display.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TransitionResult {
    pub accepted: bool,
    /// Committed state after the call. Unchanged on rejection.
    pub new_state: BasketState,
    pub reason: Option<ReasonCode>,
}

impl TransitionResult {
    fn accepted(new_state: BasketState) -> Self {
        Self { accepted: true, new_state, reason: None }
    }

    fn rejected(current: BasketState, reason: ReasonCode) -> Self {
        Self { accepted: false, new_state: current, reason: Some(reason) }
    }
}

/// The basket lifecycle engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use basketflow::action::LoggingPublisher;
/// use basketflow::catalog::{BasketState, LifecycleEvent};
/// use basketflow::config::EngineConfig;
/// use basketflow::engine::LifecycleEngine;
/// use basketflow::guard::{
///     BasketSnapshot, Constituent, GuardContext, Principal, Role,
/// };
/// use basketflow::store::MemoryStore;
/// use uuid::Uuid;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let engine = LifecycleEngine::new(
///     EngineConfig::default(),
///     Arc::new(MemoryStore::new()),
///     Arc::new(LoggingPublisher),
/// );
///
/// let basket = Uuid::new_v4();
/// let snapshot = BasketSnapshot {
///     basket_code: "TECH10".into(),
///     submitter: "alice".into(),
///     constituents: vec![Constituent { symbol: "AAPL".into(), weight: 100.0 }],
/// };
/// let ctx = GuardContext::new(Principal::new("alice", [Role::Author]))
///     .with_snapshot(snapshot);
///
/// let result = engine
///     .send_event(basket, LifecycleEvent::TriggerBacktest, ctx)
///     .await
///     .unwrap();
/// assert!(result.accepted);
/// assert_eq!(result.new_state, BasketState::Backtesting);
/// # });
/// ```
pub struct LifecycleEngine {
    table: TransitionTable,
    config: EngineConfig,
    store: Arc<dyn BasketStore>,
    executor: ActionExecutor,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LifecycleEngine {
    /// Engine over the authoritative lifecycle table.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn BasketStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            table: lifecycle_table(),
            config,
            store,
            executor: ActionExecutor::new(publisher),
            locks: DashMap::new(),
        }
    }

    /// The transition table this engine runs on.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Submit a lifecycle event for an entity.
    ///
    /// Exactly one audit record is produced per call, except when the
    /// store itself fails: after [`EngineError::Persistence`] the
    /// outcome is unknown and callers must re-query `current_state`.
    pub async fn send_event(
        &self,
        entity_id: Uuid,
        event: LifecycleEvent,
        ctx: GuardContext,
    ) -> Result<TransitionResult, EngineError> {
        // Terminal entities reject without touching the lock table,
        // which therefore stays bounded by the live population. The
        // rejection append needs no serialization.
        let preloaded = self.store.load(entity_id).await.map_err(EngineError::Persistence)?;
        if preloaded.current_state.is_terminal() {
            return self.reject(&preloaded, event, &ctx, ReasonCode::TerminalState).await;
        }

        let lock = self.entity_lock(entity_id);
        let _serialized = lock.lock().await;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let instance = self.store.load(entity_id).await.map_err(EngineError::Persistence)?;
            let current = instance.current_state;

            if current.is_terminal() {
                return self.reject(&instance, event, &ctx, ReasonCode::TerminalState).await;
            }

            let Some(rule) = self.table.resolve(current, event) else {
                return self.reject(&instance, event, &ctx, ReasonCode::InvalidTransition).await;
            };

            // Engine-tracked counters flow into the guard context; the
            // caller-supplied parts (snapshot, payload, principal) pass
            // through untouched.
            let mut eval_ctx = ctx.clone();
            eval_ctx.retry_count = instance.retry_count;
            eval_ctx.approvals = instance.approvals.clone();

            let outcome = guard::evaluate(rule.guard, event, &eval_ctx, &self.config);
            debug!(
                %entity_id,
                state = current.name(),
                event = event.name(),
                guard = rule.guard.name(),
                allow = outcome.is_allow(),
                "guard evaluated"
            );

            let commit = match outcome {
                GuardOutcome::Allow => {
                    let mut updated = instance.clone();
                    updated.current_state = rule.target;
                    updated.version += 1;
                    updated.transition_count += 1;
                    updated.last_transition_at = Utc::now();
                    match event {
                        LifecycleEvent::RetryListing => updated.retry_count += 1,
                        LifecycleEvent::ListingCompleted => updated.retry_count = 0,
                        _ => {}
                    }
                    // Leaving PendingApproval closes the approval round.
                    if current == BasketState::PendingApproval {
                        updated.approvals.clear();
                    }

                    let record = self.record(
                        &instance,
                        event,
                        &eval_ctx,
                        Some(rule.target),
                        None,
                        updated.transition_count,
                    );
                    self.store
                        .commit(updated, instance.version, record.clone())
                        .await
                        .map(|()| {
                            info!(
                                %entity_id,
                                from = current.name(),
                                to = rule.target.name(),
                                event = event.name(),
                                "transition committed"
                            );
                            let _detached = self.executor.dispatch(rule.action, &record);
                            // A terminal entity can never transition
                            // again, so its lock and dedupe entries are
                            // dead weight from here on.
                            if rule.target.is_terminal() {
                                self.locks.remove(&entity_id);
                                self.executor.forget(entity_id);
                            }
                            TransitionResult::accepted(rule.target)
                        })
                }
                GuardOutcome::Deny(ReasonCode::ApprovalQuorumPending) => {
                    // First half of a dual approval: no state change,
                    // but the approval itself must be durably recorded.
                    let mut updated = instance.clone();
                    updated.version += 1;
                    updated.approvals.insert(ctx.principal.id.clone());

                    let record = self.record(
                        &instance,
                        event,
                        &eval_ctx,
                        None,
                        Some(ReasonCode::ApprovalQuorumPending),
                        instance.transition_count,
                    );
                    self.store
                        .commit(updated, instance.version, record)
                        .await
                        .map(|()| {
                            info!(
                                %entity_id,
                                approver = ctx.principal.id,
                                "partial approval recorded, quorum pending"
                            );
                            TransitionResult::rejected(current, ReasonCode::ApprovalQuorumPending)
                        })
                }
                GuardOutcome::Deny(reason) => {
                    return self.reject(&instance, event, &ctx, reason).await;
                }
            };

            match commit {
                Ok(result) => return Ok(result),
                Err(StoreError::VersionConflict { expected, actual }) => {
                    // A concurrent writer won; reload and re-evaluate.
                    debug!(%entity_id, expected, actual, attempt, "commit conflict, retrying");
                    if attempt >= self.config.commit_attempts {
                        warn!(%entity_id, attempts = attempt, "commit contention budget exhausted");
                        return Err(EngineError::Busy { attempts: attempt });
                    }
                }
                Err(err) => return Err(EngineError::Persistence(err)),
            }
        }
    }

    /// Latest committed state. Lock-free.
    pub async fn current_state(&self, entity_id: Uuid) -> Result<BasketState, EngineError> {
        let instance = self.store.load(entity_id).await.map_err(EngineError::Persistence)?;
        Ok(instance.current_state)
    }

    /// Latest committed instance record. Lock-free.
    pub async fn instance(&self, entity_id: Uuid) -> Result<StateMachineInstance, EngineError> {
        self.store.load(entity_id).await.map_err(EngineError::Persistence)
    }

    /// Events with a declared rule out of the current state. Lock-free;
    /// empty for terminal states. Guards are not pre-evaluated here:
    /// this answers "what is structurally possible", not "what will
    /// succeed".
    pub async fn available_transitions(
        &self,
        entity_id: Uuid,
    ) -> Result<Vec<LifecycleEvent>, EngineError> {
        let state = self.current_state(entity_id).await?;
        Ok(self.table.allowed_events(state))
    }

    /// Ordered audit trail for an entity. Lock-free, replayable.
    pub async fn audit_trail(&self, entity_id: Uuid) -> Result<Vec<TransitionRecord>, EngineError> {
        self.store.audit_trail(entity_id).await.map_err(EngineError::Persistence)
    }

    fn entity_lock(&self, entity_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(entity_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Audit and return a rejection. The record append is the only
    /// write on this path.
    async fn reject(
        &self,
        instance: &StateMachineInstance,
        event: LifecycleEvent,
        ctx: &GuardContext,
        reason: ReasonCode,
    ) -> Result<TransitionResult, EngineError> {
        warn!(
            entity_id = %instance.entity_id,
            state = instance.current_state.name(),
            event = event.name(),
            reason = reason.name(),
            "transition rejected"
        );
        let record = self.record(
            instance,
            event,
            ctx,
            None,
            Some(reason),
            instance.transition_count,
        );
        self.store
            .append_rejection(record)
            .await
            .map_err(EngineError::Persistence)?;
        Ok(TransitionResult::rejected(instance.current_state, reason))
    }

    fn record(
        &self,
        instance: &StateMachineInstance,
        event: LifecycleEvent,
        ctx: &GuardContext,
        to_state: Option<BasketState>,
        reason: Option<ReasonCode>,
        transition_count: u64,
    ) -> TransitionRecord {
        TransitionRecord {
            entity_id: instance.entity_id,
            from_state: instance.current_state,
            to_state,
            event,
            actor: ctx.principal.id.clone(),
            timestamp: Utc::now(),
            outcome: if to_state.is_some() {
                TransitionOutcome::Accepted
            } else {
                TransitionOutcome::Rejected
            },
            reason,
            guard_context: serde_json::json!({
                "payload": ctx.payload,
                "retry_count": instance.retry_count,
                "approvals": instance.approvals,
            })
            .to_string(),
            transition_count,
        }
    }
}
