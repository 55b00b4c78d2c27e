//! Session orchestrator.
//!
//! Owns the game session lifecycle and ties a game's outcome to its wager
//! settlement: creating a wagered session stakes both players through the
//! wager coordinator (deleting the session again if staking fails), and
//! completing it resolves the wager before the final scores are
//! persisted. A session whose wager cannot be settled is never marked
//! completed.

pub mod error;
pub mod orchestrator;

pub use error::{Result, SessionError};
pub use orchestrator::{CompletedGame, CreateSession, SessionOrchestrator};
