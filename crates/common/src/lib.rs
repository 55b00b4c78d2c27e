//! Shared types for the token wager system.
//!
//! This crate provides the identifier newtypes used across the workspace,
//! the [`Tokens`] balance value object, and the [`Outcome`] soft-result
//! type that carries expected business rejections as values rather than
//! errors.

pub mod ids;
pub mod outcome;
pub mod tokens;

pub use ids::{SessionId, UserId, WagerId};
pub use outcome::Outcome;
pub use tokens::Tokens;
