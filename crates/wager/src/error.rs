//! Wager coordinator error types.

use common::UserId;
use ledger::LedgerError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during wager coordination.
///
/// Business-rule violations (duplicate wager, already resolved, winner not
/// a participant, insufficient tokens) never appear here; they come back
/// as [`common::Outcome`] rejections. This channel carries storage and
/// ledger faults only.
#[derive(Debug, Error)]
pub enum WagerError {
    /// A player row referenced by a stored wager is missing.
    #[error("Wager references missing player {0}")]
    PlayerRecordMissing(UserId),

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for wager operations.
pub type Result<T> = std::result::Result<T, WagerError>;
