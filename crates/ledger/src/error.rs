//! Ledger error types.

use common::UserId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// Business rejections (insufficient tokens, missing user inside a
/// mutation) are not errors; they are [`common::Outcome`] values.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A balance was read for a user that does not exist.
    #[error("User with ID {0} not found")]
    UserNotFound(UserId),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
