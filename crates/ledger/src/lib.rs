//! Token balance ledger.
//!
//! The ledger is the only component allowed to mutate a user's token
//! balance. Every mutation is a read-modify-write inside one store
//! transaction, so two concurrent stakes against the same balance
//! serialize at the storage layer rather than clobbering each other.
//!
//! Expected business states (insufficient tokens, missing user inside a
//! mutation) come back as [`common::Outcome`] rejections, not errors; the
//! error channel is reserved for storage faults and the hard not-found on
//! a plain balance read.

pub mod account;
pub mod error;

pub use account::{AccountLedger, TokenLedger};
pub use error::{LedgerError, Result};
