//! Basketflow: a guarded lifecycle state machine engine for financial
//! baskets.
//!
//! A basket moves through its workflow (draft, backtest, approval,
//! listing, trading, terminal) along a statically declared transition
//! table. The engine enforces structural legality via the table,
//! business rules via pure guard predicates, per-entity serialization
//! via keyed locks plus optimistic versioning, and appends an immutable
//! audit record for every attempt, accepted or rejected. Side effects
//! are dispatched after commit on detached tasks and never roll a
//! committed transition back.
//!
//! # Core Concepts
//!
//! - **Catalog**: closed enums of lifecycle states and trigger events
//! - **Table**: the single source of truth for legal `(state, event)` moves
//! - **Guards**: pure predicates deciding whether a legal move may fire now
//! - **Engine**: serialized load-guard-commit with a bounded conflict budget
//! - **Audit**: replayable, append-only trail of every attempt
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use basketflow::action::LoggingPublisher;
//! use basketflow::catalog::{BasketState, LifecycleEvent};
//! use basketflow::config::EngineConfig;
//! use basketflow::engine::LifecycleEngine;
//! use basketflow::guard::{BasketSnapshot, Constituent, GuardContext, Principal, Role};
//! use basketflow::store::MemoryStore;
//! use uuid::Uuid;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let engine = LifecycleEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LoggingPublisher),
//! );
//!
//! let basket = Uuid::new_v4();
//! let ctx = GuardContext::new(Principal::new("alice", [Role::Author]))
//!     .with_snapshot(BasketSnapshot {
//!         basket_code: "TECH10".into(),
//!         submitter: "alice".into(),
//!         constituents: vec![Constituent { symbol: "AAPL".into(), weight: 100.0 }],
//!     });
//!
//! let result = engine
//!     .send_event(basket, LifecycleEvent::TriggerBacktest, ctx)
//!     .await
//!     .unwrap();
//! assert!(result.accepted);
//! assert_eq!(result.new_state, BasketState::Backtesting);
//! # });
//! ```

pub mod action;
pub mod archive;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod guard;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use action::{ActionExecutor, ActionId, EventPublisher, LoggingPublisher};
pub use audit::{TransitionOutcome, TransitionRecord};
pub use catalog::{BasketState, EventCategory, LifecycleEvent};
pub use config::{ApprovalMode, EngineConfig};
pub use engine::{EngineError, LifecycleEngine, TransitionResult};
pub use guard::{GuardContext, GuardId, GuardOutcome, Principal, ReasonCode, Role};
pub use store::{BasketStore, MemoryStore, StateMachineInstance, StoreError};
pub use table::{lifecycle_table, TransitionRule, TransitionTable};
