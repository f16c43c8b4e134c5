//! Lifecycle trigger events.

use serde::{Deserialize, Serialize};

/// Who is expected to emit an event.
///
/// The category routes authorization only; it never influences which
/// transition a rule resolves to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum EventCategory {
    /// Issued by the basket owner or another interactive user.
    UserAction,
    /// Issued by a downstream system reporting a workflow outcome.
    SystemEvent,
    /// Issued by an operations/admin principal.
    AdminAction,
}

/// One trigger in the basket lifecycle.
///
/// Events name the intent ("approve this basket"), not the resulting
/// state; the transition table decides what, if anything, an event does
/// from the current state.
///
/// # Example
///
/// ```rust
/// use basketflow::catalog::{EventCategory, LifecycleEvent};
///
/// assert_eq!(LifecycleEvent::ApproveBasket.category(), EventCategory::UserAction);
/// assert_eq!(LifecycleEvent::AdminSuspend.category(), EventCategory::AdminAction);
/// assert_eq!(LifecycleEvent::BacktestCompleted.category(), EventCategory::SystemEvent);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LifecycleEvent {
    TriggerBacktest,
    BacktestCompleted,
    BacktestFailed,
    SubmitForApproval,
    ApproveBasket,
    RejectBasket,
    WithdrawSubmission,
    StartListing,
    ListingCompleted,
    ListingFailed,
    RetryListing,
    ActivateTrading,
    AdminSuspend,
    AdminResume,
    AdminDelist,
    ModifyBasket,
    DeleteBasket,
}

impl LifecycleEvent {
    /// All events. Used for discoverability queries and randomized tests.
    pub const ALL: [LifecycleEvent; 17] = [
        Self::TriggerBacktest,
        Self::BacktestCompleted,
        Self::BacktestFailed,
        Self::SubmitForApproval,
        Self::ApproveBasket,
        Self::RejectBasket,
        Self::WithdrawSubmission,
        Self::StartListing,
        Self::ListingCompleted,
        Self::ListingFailed,
        Self::RetryListing,
        Self::ActivateTrading,
        Self::AdminSuspend,
        Self::AdminResume,
        Self::AdminDelist,
        Self::ModifyBasket,
        Self::DeleteBasket,
    ];

    /// Stable identifier for logging and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TriggerBacktest => "TriggerBacktest",
            Self::BacktestCompleted => "BacktestCompleted",
            Self::BacktestFailed => "BacktestFailed",
            Self::SubmitForApproval => "SubmitForApproval",
            Self::ApproveBasket => "ApproveBasket",
            Self::RejectBasket => "RejectBasket",
            Self::WithdrawSubmission => "WithdrawSubmission",
            Self::StartListing => "StartListing",
            Self::ListingCompleted => "ListingCompleted",
            Self::ListingFailed => "ListingFailed",
            Self::RetryListing => "RetryListing",
            Self::ActivateTrading => "ActivateTrading",
            Self::AdminSuspend => "AdminSuspend",
            Self::AdminResume => "AdminResume",
            Self::AdminDelist => "AdminDelist",
            Self::ModifyBasket => "ModifyBasket",
            Self::DeleteBasket => "DeleteBasket",
        }
    }

    /// Authorization routing category.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::TriggerBacktest
            | Self::SubmitForApproval
            | Self::ApproveBasket
            | Self::RejectBasket
            | Self::WithdrawSubmission
            | Self::StartListing
            | Self::RetryListing
            | Self::ModifyBasket
            | Self::DeleteBasket => EventCategory::UserAction,
            Self::BacktestCompleted
            | Self::BacktestFailed
            | Self::ListingCompleted
            | Self::ListingFailed
            | Self::ActivateTrading => EventCategory::SystemEvent,
            Self::AdminSuspend | Self::AdminResume | Self::AdminDelist => {
                EventCategory::AdminAction
            }
        }
    }
}
