//! Persistence layer for the token wager system.
//!
//! This crate owns the stored records (user accounts, game sessions,
//! wagers) and the [`GameStore`]/[`StoreTx`] transaction abstraction the
//! services mutate them through. Two backends are provided: an in-memory
//! store for tests and a PostgreSQL store backed by `sqlx`.
//!
//! All writes happen inside a [`StoreTx`]. Dropping a transaction without
//! committing discards its writes, so every early return rolls back.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use common::{SessionId, Tokens, UserId, WagerId};
pub use error::{Result, StoreError};
pub use memory::{MemoryStore, MemoryTx};
pub use postgres::{PostgresStore, PostgresTx};
pub use records::{GameMode, SessionRecord, SessionStatus, UserAccount, WagerRecord, WagerStatus};
pub use store::{GameStore, StoreTx};
