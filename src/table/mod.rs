//! The declarative transition table.
//!
//! The table is the single source of truth for which `(state, event)`
//! pairs are legal. It is built once at process start from a static
//! rule list and never mutated afterwards; duplicate registration is a
//! startup-time fatal configuration error, never a runtime condition.

mod error;

pub use error::TableError;

use crate::action::ActionId;
use crate::catalog::{BasketState, LifecycleEvent};
use crate::guard::GuardId;
use std::collections::HashMap;

/// One declared transition: `(source, event) -> target`, with the guard
/// that must allow it and the action dispatched after it commits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TransitionRule {
    pub source: BasketState,
    pub event: LifecycleEvent,
    pub target: BasketState,
    pub guard: GuardId,
    pub action: ActionId,
}

/// Immutable mapping from `(source, event)` to a [`TransitionRule`].
///
/// # Example
///
/// ```rust
/// use basketflow::catalog::{BasketState, LifecycleEvent};
/// use basketflow::table::lifecycle_table;
///
/// let table = lifecycle_table();
/// let rule = table
///     .resolve(BasketState::Draft, LifecycleEvent::TriggerBacktest)
///     .unwrap();
/// assert_eq!(rule.target, BasketState::Backtesting);
///
/// // Structurally illegal pair.
/// assert!(table.resolve(BasketState::Draft, LifecycleEvent::ApproveBasket).is_none());
/// ```
#[derive(Clone, Debug)]
pub struct TransitionTable {
    rules: HashMap<(BasketState, LifecycleEvent), TransitionRule>,
}

impl TransitionTable {
    /// Look up the rule for a `(source, event)` pair. `None` means the
    /// transition is structurally illegal, independent of guards.
    pub fn resolve(&self, source: BasketState, event: LifecycleEvent) -> Option<&TransitionRule> {
        self.rules.get(&(source, event))
    }

    /// Events with a declared rule out of `source`, in catalog order.
    /// Empty for terminal states.
    pub fn allowed_events(&self, source: BasketState) -> Vec<LifecycleEvent> {
        LifecycleEvent::ALL
            .into_iter()
            .filter(|event| self.rules.contains_key(&(source, *event)))
            .collect()
    }

    /// Number of declared rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder validating the rule set before the table is sealed.
pub struct TableBuilder {
    rules: Vec<TransitionRule>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Declare one rule.
    pub fn rule(
        mut self,
        source: BasketState,
        event: LifecycleEvent,
        target: BasketState,
        guard: GuardId,
        action: ActionId,
    ) -> Self {
        self.rules.push(TransitionRule { source, event, target, guard, action });
        self
    }

    /// Seal the table.
    ///
    /// Fails with [`TableError::DuplicateRule`] if two rules share a
    /// `(source, event)` pair and with [`TableError::TerminalSource`]
    /// if a rule departs from a terminal state.
    pub fn build(self) -> Result<TransitionTable, TableError> {
        if self.rules.is_empty() {
            return Err(TableError::NoRules);
        }
        let mut rules = HashMap::with_capacity(self.rules.len());
        for rule in self.rules {
            if rule.source.is_terminal() {
                return Err(TableError::TerminalSource {
                    state: rule.source.name(),
                    event: rule.event.name(),
                });
            }
            if rules.insert((rule.source, rule.event), rule).is_some() {
                return Err(TableError::DuplicateRule {
                    state: rule.source.name(),
                    event: rule.event.name(),
                });
            }
        }
        Ok(TransitionTable { rules })
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative basket lifecycle table.
///
/// Any other `(state, event)` pair is structurally illegal.
pub fn lifecycle_table() -> TransitionTable {
    use ActionId as A;
    use BasketState as S;
    use GuardId as G;
    use LifecycleEvent as E;

    TableBuilder::new()
        .rule(S::Draft, E::TriggerBacktest, S::Backtesting, G::BasketValid, A::StartBacktest)
        .rule(S::Draft, E::DeleteBasket, S::Deleted, G::OwnerAuth, A::PublishStatusChanged)
        .rule(S::Draft, E::ModifyBasket, S::Draft, G::None, A::PublishStatusChanged)
        .rule(S::Backtesting, E::BacktestCompleted, S::Backtested, G::None, A::PublishStatusChanged)
        .rule(S::Backtesting, E::BacktestFailed, S::BacktestFailed, G::None, A::PublishStatusChanged)
        .rule(S::BacktestFailed, E::ModifyBasket, S::Draft, G::None, A::PublishStatusChanged)
        .rule(S::Backtested, E::ModifyBasket, S::Draft, G::None, A::PublishStatusChanged)
        .rule(S::Backtested, E::SubmitForApproval, S::PendingApproval, G::BacktestValid, A::NotifyApprovers)
        .rule(S::Backtested, E::DeleteBasket, S::Deleted, G::OwnerAuth, A::PublishStatusChanged)
        .rule(S::PendingApproval, E::ApproveBasket, S::Approved, G::ApproverAuth, A::PublishStatusChanged)
        .rule(S::PendingApproval, E::RejectBasket, S::Rejected, G::ApproverAuth, A::PublishStatusChanged)
        .rule(S::PendingApproval, E::WithdrawSubmission, S::Draft, G::OwnerAuth, A::PublishStatusChanged)
        .rule(S::Rejected, E::ModifyBasket, S::Draft, G::None, A::PublishStatusChanged)
        .rule(S::Approved, E::StartListing, S::Listing, G::None, A::StartListing)
        .rule(S::Listing, E::ListingCompleted, S::Listed, G::None, A::PublishStatusChanged)
        .rule(S::Listing, E::ListingFailed, S::ListingFailed, G::None, A::PublishLifecycleHalt)
        .rule(S::ListingFailed, E::RetryListing, S::Listing, G::RetryLimit, A::StartListing)
        .rule(S::Listed, E::ActivateTrading, S::Active, G::None, A::PublishStatusChanged)
        .rule(S::Active, E::AdminSuspend, S::Suspended, G::AdminAuth, A::PublishLifecycleHalt)
        .rule(S::Active, E::AdminDelist, S::Delisted, G::AdminAuth, A::PublishLifecycleHalt)
        .rule(S::Suspended, E::AdminResume, S::Active, G::AdminAuth, A::PublishStatusChanged)
        .rule(S::Suspended, E::AdminDelist, S::Delisted, G::AdminAuth, A::PublishLifecycleHalt)
        .build()
        .expect("static lifecycle table is well-formed")
}
