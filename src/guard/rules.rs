//! The named guard predicates.
//!
//! One free function per guard, dispatched by [`evaluate`]. Each is a
//! pure function of the context and configuration; denials carry the
//! reason code surfaced to callers and written to the audit trail.

use super::{GuardContext, GuardId, GuardOutcome, ReasonCode, Role};
use crate::catalog::LifecycleEvent;
use crate::config::{ApprovalMode, EngineConfig};

/// Tolerance when checking that constituent weights sum to 100%.
const WEIGHT_TOLERANCE: f64 = 0.01;

/// Evaluate the guard referenced by a transition rule.
///
/// # Example
///
/// ```rust
/// use basketflow::catalog::LifecycleEvent;
/// use basketflow::config::EngineConfig;
/// use basketflow::guard::{evaluate, GuardContext, GuardId, GuardOutcome, Principal, Role};
///
/// let config = EngineConfig::default();
/// let ctx = GuardContext::new(Principal::new("ops-1", [Role::Admin]));
/// let outcome = evaluate(GuardId::AdminAuth, LifecycleEvent::AdminSuspend, &ctx, &config);
/// assert_eq!(outcome, GuardOutcome::Allow);
/// ```
pub fn evaluate(
    guard: GuardId,
    event: LifecycleEvent,
    ctx: &GuardContext,
    config: &EngineConfig,
) -> GuardOutcome {
    match guard {
        GuardId::None => GuardOutcome::Allow,
        GuardId::BasketValid => basket_valid(ctx),
        GuardId::BacktestValid => backtest_valid(ctx),
        GuardId::ApproverAuth => approver_auth(event, ctx, config),
        GuardId::AdminAuth => admin_auth(ctx),
        GuardId::OwnerAuth => owner_auth(ctx),
        GuardId::RetryLimit => retry_limit(ctx, config),
    }
}

/// Contents must be structurally sound before a backtest can start:
/// at least one constituent, unique symbols, positive weights summing
/// to 100%.
fn basket_valid(ctx: &GuardContext) -> GuardOutcome {
    let Some(snapshot) = &ctx.snapshot else {
        return GuardOutcome::Deny(ReasonCode::BasketNotValid);
    };
    if snapshot.constituents.is_empty() {
        return GuardOutcome::Deny(ReasonCode::BasketNotValid);
    }
    let mut seen = std::collections::BTreeSet::new();
    for constituent in &snapshot.constituents {
        if constituent.symbol.is_empty()
            || constituent.weight <= 0.0
            || !seen.insert(constituent.symbol.as_str())
        {
            return GuardOutcome::Deny(ReasonCode::BasketNotValid);
        }
    }
    if (snapshot.total_weight() - 100.0).abs() > WEIGHT_TOLERANCE {
        return GuardOutcome::Deny(ReasonCode::BasketNotValid);
    }
    GuardOutcome::Allow
}

/// A completed backtest must exist and have met the threshold.
fn backtest_valid(ctx: &GuardContext) -> GuardOutcome {
    match &ctx.backtest {
        Some(outcome) if outcome.passed() => GuardOutcome::Allow,
        _ => GuardOutcome::Deny(ReasonCode::BacktestNotValid),
    }
}

/// Approver role, plus the dual-approval quorum for `ApproveBasket`
/// when configured. The quorum never applies to `RejectBasket`: a
/// single approver can always reject.
fn approver_auth(event: LifecycleEvent, ctx: &GuardContext, config: &EngineConfig) -> GuardOutcome {
    if !ctx.principal.has_role(Role::Approver) {
        return GuardOutcome::Deny(ReasonCode::Unauthorized);
    }
    if event != LifecycleEvent::ApproveBasket || config.approval_mode == ApprovalMode::Single {
        return GuardOutcome::Allow;
    }
    if ctx.approvals.contains(&ctx.principal.id) {
        return GuardOutcome::Deny(ReasonCode::DuplicateApproval);
    }
    // This principal counts as one approval; one prior distinct
    // approval completes the quorum.
    if ctx.approvals.is_empty() {
        GuardOutcome::Deny(ReasonCode::ApprovalQuorumPending)
    } else {
        GuardOutcome::Allow
    }
}

fn admin_auth(ctx: &GuardContext) -> GuardOutcome {
    if ctx.principal.has_role(Role::Admin) {
        GuardOutcome::Allow
    } else {
        GuardOutcome::Deny(ReasonCode::Unauthorized)
    }
}

/// Only the original submitter may withdraw or delete.
fn owner_auth(ctx: &GuardContext) -> GuardOutcome {
    match &ctx.snapshot {
        Some(snapshot) if snapshot.submitter == ctx.principal.id => GuardOutcome::Allow,
        _ => GuardOutcome::Deny(ReasonCode::NotOwner),
    }
}

fn retry_limit(ctx: &GuardContext, config: &EngineConfig) -> GuardOutcome {
    if ctx.retry_count < config.max_retries {
        GuardOutcome::Allow
    } else {
        GuardOutcome::Deny(ReasonCode::RetryLimitExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{BacktestOutcome, BasketSnapshot, Constituent, Principal};

    fn snapshot(submitter: &str) -> BasketSnapshot {
        BasketSnapshot {
            basket_code: "TECH10".into(),
            submitter: submitter.into(),
            constituents: vec![
                Constituent { symbol: "AAPL".into(), weight: 55.0 },
                Constituent { symbol: "MSFT".into(), weight: 45.0 },
            ],
        }
    }

    fn author(id: &str) -> GuardContext {
        GuardContext::new(Principal::new(id, [Role::Author]))
    }

    #[test]
    fn none_guard_always_allows() {
        let config = EngineConfig::default();
        let ctx = author("alice");
        let outcome = evaluate(GuardId::None, LifecycleEvent::BacktestCompleted, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn basket_valid_accepts_well_formed_contents() {
        let config = EngineConfig::default();
        let ctx = author("alice").with_snapshot(snapshot("alice"));
        let outcome = evaluate(GuardId::BasketValid, LifecycleEvent::TriggerBacktest, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn basket_valid_rejects_missing_snapshot() {
        let config = EngineConfig::default();
        let ctx = author("alice");
        let outcome = evaluate(GuardId::BasketValid, LifecycleEvent::TriggerBacktest, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::BasketNotValid));
    }

    #[test]
    fn basket_valid_rejects_bad_weights() {
        let config = EngineConfig::default();
        let mut snap = snapshot("alice");
        snap.constituents[0].weight = 80.0; // total now 125
        let ctx = author("alice").with_snapshot(snap);
        let outcome = evaluate(GuardId::BasketValid, LifecycleEvent::TriggerBacktest, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::BasketNotValid));
    }

    #[test]
    fn basket_valid_rejects_duplicate_symbols() {
        let config = EngineConfig::default();
        let mut snap = snapshot("alice");
        snap.constituents.push(Constituent { symbol: "AAPL".into(), weight: 0.0 });
        let ctx = author("alice").with_snapshot(snap);
        let outcome = evaluate(GuardId::BasketValid, LifecycleEvent::TriggerBacktest, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::BasketNotValid));
    }

    #[test]
    fn backtest_valid_requires_passing_result() {
        let config = EngineConfig::default();
        let ctx = author("alice")
            .with_backtest(BacktestOutcome { completed: true, score: 1.2, threshold: 1.0 });
        let outcome =
            evaluate(GuardId::BacktestValid, LifecycleEvent::SubmitForApproval, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);

        let ctx = author("alice")
            .with_backtest(BacktestOutcome { completed: true, score: 0.2, threshold: 1.0 });
        let outcome =
            evaluate(GuardId::BacktestValid, LifecycleEvent::SubmitForApproval, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::BacktestNotValid));
    }

    #[test]
    fn approver_auth_denies_missing_role() {
        let config = EngineConfig::default();
        let ctx = author("alice");
        let outcome = evaluate(GuardId::ApproverAuth, LifecycleEvent::ApproveBasket, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::Unauthorized));
    }

    #[test]
    fn approver_auth_single_mode_allows_first_approver() {
        let config = EngineConfig::default();
        let ctx = GuardContext::new(Principal::new("approver1", [Role::Approver]));
        let outcome = evaluate(GuardId::ApproverAuth, LifecycleEvent::ApproveBasket, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn approver_auth_dual_mode_waits_for_quorum() {
        let config = EngineConfig {
            approval_mode: ApprovalMode::Dual,
            ..EngineConfig::default()
        };
        let mut ctx = GuardContext::new(Principal::new("approver1", [Role::Approver]));
        let outcome = evaluate(GuardId::ApproverAuth, LifecycleEvent::ApproveBasket, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::ApprovalQuorumPending));

        // Same approver again: counted once only.
        ctx.approvals.insert("approver1".into());
        let outcome = evaluate(GuardId::ApproverAuth, LifecycleEvent::ApproveBasket, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::DuplicateApproval));

        // A distinct second approver completes the quorum.
        let ctx2 = GuardContext {
            principal: Principal::new("approver2", [Role::Approver]),
            ..ctx
        };
        let outcome = evaluate(GuardId::ApproverAuth, LifecycleEvent::ApproveBasket, &ctx2, &config);
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn dual_mode_rejection_needs_no_quorum() {
        let config = EngineConfig {
            approval_mode: ApprovalMode::Dual,
            ..EngineConfig::default()
        };
        let ctx = GuardContext::new(Principal::new("approver1", [Role::Approver]));
        let outcome = evaluate(GuardId::ApproverAuth, LifecycleEvent::RejectBasket, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn owner_auth_matches_submitter() {
        let config = EngineConfig::default();
        let ctx = author("alice").with_snapshot(snapshot("alice"));
        let outcome =
            evaluate(GuardId::OwnerAuth, LifecycleEvent::WithdrawSubmission, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);

        let ctx = author("mallory").with_snapshot(snapshot("alice"));
        let outcome =
            evaluate(GuardId::OwnerAuth, LifecycleEvent::WithdrawSubmission, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::NotOwner));
    }

    #[test]
    fn retry_limit_enforces_budget() {
        let config = EngineConfig::default();
        let mut ctx = author("alice");
        ctx.retry_count = 2;
        let outcome = evaluate(GuardId::RetryLimit, LifecycleEvent::RetryListing, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Allow);

        ctx.retry_count = 3;
        let outcome = evaluate(GuardId::RetryLimit, LifecycleEvent::RetryListing, &ctx, &config);
        assert_eq!(outcome, GuardOutcome::Deny(ReasonCode::RetryLimitExceeded));
    }

    #[test]
    fn guards_are_deterministic() {
        let config = EngineConfig::default();
        let ctx = author("alice").with_snapshot(snapshot("alice"));
        let first = evaluate(GuardId::BasketValid, LifecycleEvent::TriggerBacktest, &ctx, &config);
        let second = evaluate(GuardId::BasketValid, LifecycleEvent::TriggerBacktest, &ctx, &config);
        assert_eq!(first, second);
    }
}
