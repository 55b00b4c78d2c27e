//! Wager coordinator.
//!
//! Owns the wager entity and its state machine: a wager is created with
//! both stakes held (`Staked`) and resolved exactly once, either to a
//! winner (`Won`, the pot released) or as a draw (`Refunded`, each stake
//! returned). All balance movement goes through the token ledger inside
//! one store transaction, so a failed stake never leaves a wager behind
//! and a failed payout never leaves a wager resolved.

pub mod coordinator;
pub mod error;

pub use coordinator::{CreateWager, WagerCoordinator, WagerDetails};
pub use error::{Result, WagerError};
