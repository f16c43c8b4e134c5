//! Basket lifecycle states.
//!
//! States are immutable values describing where a basket sits in its
//! workflow, from draft through backtesting, approval, listing and
//! trading, down to the soft-terminal `Delisted` and `Deleted` states.

use serde::{Deserialize, Serialize};

/// One state of the basket lifecycle.
///
/// The set is closed: every basket is in exactly one of these states at
/// any time, and the transition table (`crate::table`) is the single
/// source of truth for which moves between them are legal.
///
/// # Example
///
/// ```rust
/// use basketflow::catalog::BasketState;
///
/// assert!(BasketState::Draft.is_user_editable());
/// assert!(!BasketState::Draft.is_terminal());
/// assert!(BasketState::Deleted.is_terminal());
/// assert!(BasketState::Active.is_operational());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BasketState {
    /// User is creating or editing the basket.
    Draft,
    /// Historical analysis is running.
    Backtesting,
    /// Backtest completed successfully.
    Backtested,
    /// Backtest encountered errors.
    BacktestFailed,
    /// Submitted and waiting for an approver.
    PendingApproval,
    /// Approved by the designated approver(s).
    Approved,
    /// Rejected by an approver.
    Rejected,
    /// Publishing to vendor platforms.
    Listing,
    /// Successfully listed on vendor platforms.
    Listed,
    /// Failed to list on vendor platforms.
    ListingFailed,
    /// Live basket with real-time pricing.
    Active,
    /// Temporarily suspended from trading.
    Suspended,
    /// Removed from vendor platforms. Terminal.
    Delisted,
    /// Permanently deleted. Terminal.
    Deleted,
}

impl BasketState {
    /// All states, in lifecycle order. Used for discoverability queries
    /// and randomized tests.
    pub const ALL: [BasketState; 14] = [
        Self::Draft,
        Self::Backtesting,
        Self::Backtested,
        Self::BacktestFailed,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Listing,
        Self::Listed,
        Self::ListingFailed,
        Self::Active,
        Self::Suspended,
        Self::Delisted,
        Self::Deleted,
    ];

    /// Stable identifier for logging and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Backtesting => "Backtesting",
            Self::Backtested => "Backtested",
            Self::BacktestFailed => "BacktestFailed",
            Self::PendingApproval => "PendingApproval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Listing => "Listing",
            Self::Listed => "Listed",
            Self::ListingFailed => "ListingFailed",
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Delisted => "Delisted",
            Self::Deleted => "Deleted",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Backtesting => "Backtesting",
            Self::Backtested => "Backtested",
            Self::BacktestFailed => "Backtest Failed",
            Self::PendingApproval => "Pending Approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Listing => "Listing",
            Self::Listed => "Listed",
            Self::ListingFailed => "Listing Failed",
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Delisted => "Delisted",
            Self::Deleted => "Deleted",
        }
    }

    /// Terminal states have no outgoing transitions. The instance record
    /// is retained for audit purposes (soft-terminal), never deleted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted | Self::Delisted)
    }

    /// One-line description for status displays.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Draft => "User is creating/editing basket",
            Self::Backtesting => "Running historical analysis",
            Self::Backtested => "Backtest completed successfully",
            Self::BacktestFailed => "Backtest encountered errors",
            Self::PendingApproval => "Submitted for approval",
            Self::Approved => "Approved by designated approver",
            Self::Rejected => "Rejected by approver",
            Self::Listing => "Publishing to vendor platforms",
            Self::Listed => "Successfully listed on vendor platforms",
            Self::ListingFailed => "Failed to list on vendor platforms",
            Self::Active => "Live basket with real-time pricing",
            Self::Suspended => "Temporarily suspended from trading",
            Self::Delisted => "Removed from vendor platforms",
            Self::Deleted => "Basket permanently deleted",
        }
    }

    /// Whether basket contents may be mutated while in this state.
    pub fn is_user_editable(&self) -> bool {
        matches!(
            self,
            Self::Draft
                | Self::Backtested
                | Self::BacktestFailed
                | Self::Rejected
                | Self::ListingFailed
                | Self::Suspended
        )
    }

    /// Whether the basket is live from a trading perspective.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Active | Self::Suspended)
    }
}
