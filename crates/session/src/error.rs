//! Session orchestrator error types.

use common::{SessionId, UserId};
use ledger::LedgerError;
use store::StoreError;
use thiserror::Error;
use wager::WagerError;

/// Errors that can occur during session orchestration.
///
/// Unlike the wager coordinator, the orchestrator's callers treat a
/// session that cannot be created or completed as a failure, so soft
/// coordinator rejections are converted into hard errors here
/// ([`SessionError::WagerSetup`], [`SessionError::WagerResolution`]).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session not found.
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    /// A referenced player does not exist.
    #[error("Player with ID {0} not found")]
    PlayerNotFound(UserId),

    /// A player tried to start a game against themselves.
    #[error("A player cannot start a game against themselves")]
    SelfPlay,

    /// A multiplayer or wagered session was requested without an opponent.
    #[error("An opponent is required for this game mode")]
    OpponentRequired,

    /// The wager amount was missing or not positive.
    #[error("Wager amount must be a positive number of tokens")]
    InvalidWagerAmount,

    /// A player cannot cover the wager at session-creation time.
    #[error("{username} has insufficient tokens for this wager")]
    InsufficientTokens { username: String },

    /// Wager creation was rejected; the session was rolled back.
    #[error("Wager setup failed: {0}")]
    WagerSetup(String),

    /// Wager resolution was rejected; the completion was not persisted.
    #[error("Wager resolution failed: {0}")]
    WagerResolution(String),

    /// The session has no wager to settle.
    #[error("Session {0} does not have a wager")]
    NotWagered(SessionId),

    /// The session was already completed.
    #[error("Session {0} has already been completed")]
    AlreadyCompleted(SessionId),

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Wager coordinator error.
    #[error("Wager error: {0}")]
    Wager(#[from] WagerError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
