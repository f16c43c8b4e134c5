//! Closed catalog of lifecycle states and trigger events.
//!
//! The catalog is the leaf of the engine: two closed enumerations with
//! pure metadata lookups and no error conditions. Unknown states or
//! events are a compile-time impossibility, not a runtime concern.

mod event;
mod state;

pub use event::{EventCategory, LifecycleEvent};
pub use state::BasketState;
