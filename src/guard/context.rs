//! Context handed to guard evaluation.
//!
//! The context carries everything a guard is allowed to look at: the
//! basket content snapshot, the acting principal, the event payload,
//! and the engine-tracked counters. It is assembled by the caller and
//! the engine; guards only read it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role held by a principal, as resolved by the authorization provider
/// before the engine is invoked.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Role {
    /// May create, edit and submit baskets.
    Author,
    /// May approve or reject submitted baskets.
    Approver,
    /// May suspend, resume and delist live baskets.
    Admin,
}

/// The acting principal for a transition attempt.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier (login or service account name).
    pub id: String,
    /// Pre-resolved roles. The engine never calls out to look these up.
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// One constituent of a basket.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Constituent {
    pub symbol: String,
    /// Target weight in percent.
    pub weight: f64,
}

/// Read-only snapshot of basket contents, taken by the caller before
/// invoking the engine.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BasketSnapshot {
    pub basket_code: String,
    /// Principal id of the original submitter.
    pub submitter: String,
    pub constituents: Vec<Constituent>,
}

impl BasketSnapshot {
    /// Sum of constituent weights, in percent.
    pub fn total_weight(&self) -> f64 {
        self.constituents.iter().map(|c| c.weight).sum()
    }
}

/// Result of a completed backtest run, pre-fetched by the caller.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct BacktestOutcome {
    /// Whether the run itself completed without errors.
    pub completed: bool,
    /// Score achieved by the run (e.g. annualized Sharpe).
    pub score: f64,
    /// Minimum score the basket must reach to be submittable.
    pub threshold: f64,
}

impl BacktestOutcome {
    pub fn passed(&self) -> bool {
        self.completed && self.score >= self.threshold
    }
}

/// Everything a guard may inspect for one transition attempt.
///
/// # Example
///
/// ```rust
/// use basketflow::guard::{GuardContext, Principal, Role};
///
/// let ctx = GuardContext::new(Principal::new("alice", [Role::Author]));
/// assert_eq!(ctx.retry_count, 0);
/// assert!(ctx.snapshot.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct GuardContext {
    /// The acting principal.
    pub principal: Principal,
    /// Content snapshot, if the caller attached one.
    pub snapshot: Option<BasketSnapshot>,
    /// Pre-fetched backtest result, if any.
    pub backtest: Option<BacktestOutcome>,
    /// Free-form event payload, recorded into the audit trail.
    pub payload: serde_json::Value,
    /// Listing retry counter from the instance record.
    pub retry_count: u32,
    /// Distinct principals that already issued `ApproveBasket` for the
    /// current `PendingApproval` round. Maintained by the engine.
    pub approvals: BTreeSet<String>,
}

impl GuardContext {
    /// Context with only a principal; everything else empty.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            snapshot: None,
            backtest: None,
            payload: serde_json::Value::Null,
            retry_count: 0,
            approvals: BTreeSet::new(),
        }
    }

    pub fn with_snapshot(mut self, snapshot: BasketSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_backtest(mut self, backtest: BacktestOutcome) -> Self {
        self.backtest = Some(backtest);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_role_lookup() {
        let p = Principal::new("ops-1", [Role::Admin, Role::Approver]);
        assert!(p.has_role(Role::Admin));
        assert!(p.has_role(Role::Approver));
        assert!(!p.has_role(Role::Author));
    }

    #[test]
    fn snapshot_total_weight_sums_constituents() {
        let snapshot = BasketSnapshot {
            basket_code: "TECH10".into(),
            submitter: "alice".into(),
            constituents: vec![
                Constituent { symbol: "AAPL".into(), weight: 60.0 },
                Constituent { symbol: "MSFT".into(), weight: 40.0 },
            ],
        };
        assert!((snapshot.total_weight() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn backtest_outcome_requires_completion_and_threshold() {
        let passing = BacktestOutcome { completed: true, score: 1.4, threshold: 1.0 };
        let low = BacktestOutcome { completed: true, score: 0.4, threshold: 1.0 };
        let crashed = BacktestOutcome { completed: false, score: 2.0, threshold: 1.0 };
        assert!(passing.passed());
        assert!(!low.passed());
        assert!(!crashed.passed());
    }

    #[test]
    fn builder_style_context_assembly() {
        let ctx = GuardContext::new(Principal::new("alice", [Role::Author]))
            .with_payload(serde_json::json!({"note": "resubmit"}));
        assert_eq!(ctx.payload["note"], "resubmit");
    }
}
