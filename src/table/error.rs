//! Table construction errors.

use thiserror::Error;

/// Fatal configuration errors raised while sealing the transition
/// table at startup.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("No rules declared. Add at least one transition rule")]
    NoRules,

    #[error("Duplicate rule for ({state}, {event}). At most one rule per (source, event) pair")]
    DuplicateRule {
        state: &'static str,
        event: &'static str,
    },

    #[error("Rule ({state}, {event}) departs from a terminal state")]
    TerminalSource {
        state: &'static str,
        event: &'static str,
    },
}
