//! Withdrawal Saga State Definitions
//!
//! The withdrawal flow is record-before-broadcast: a ledger record is created
//! first, then the chain transaction is built and broadcast. Any failure after
//! the record exists must compensate by cancelling it, exactly once.

use std::fmt;

/// Withdrawal saga states.
///
/// Terminal states: COMPLETED, REJECTED, CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaState {
    /// Request received, nothing resolved yet
    Initiated,

    /// Sender ledger account fetched
    AccountResolved,

    /// Asset/currency checks passed
    Validated,

    /// Terminal: validation failed, no record was ever created
    Rejected,

    /// Ledger record created - from here on a failure MUST compensate
    Recorded,

    /// Envelope build or signing failed after recording
    BuildFailed,

    /// Chain broadcast failed after recording
    BroadcastFailed,

    /// Compensation (record cancellation) in progress
    Cancelling,

    /// Terminal: record cancelled after a post-record failure
    Cancelled,

    /// Transaction accepted by the chain gateway
    Broadcast,

    /// Terminal: broadcast confirmed and record completed upstream
    Completed,
}

impl SagaState {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Completed | SagaState::Rejected | SagaState::Cancelled
        )
    }

    /// Check if a ledger record exists that has not reached a settled outcome.
    /// These states must not be abandoned without compensation.
    #[inline]
    pub fn needs_compensation(&self) -> bool {
        matches!(
            self,
            SagaState::BuildFailed | SagaState::BroadcastFailed | SagaState::Cancelling
        )
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Initiated => "INITIATED",
            SagaState::AccountResolved => "ACCOUNT_RESOLVED",
            SagaState::Validated => "VALIDATED",
            SagaState::Rejected => "REJECTED",
            SagaState::Recorded => "RECORDED",
            SagaState::BuildFailed => "BUILD_FAILED",
            SagaState::BroadcastFailed => "BROADCAST_FAILED",
            SagaState::Cancelling => "CANCELLING",
            SagaState::Cancelled => "CANCELLED",
            SagaState::Broadcast => "BROADCAST",
            SagaState::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
