//! Soft business outcomes.

use serde::{Deserialize, Serialize};

/// A business-rule outcome: accepted with a payload, or rejected with a
/// user-facing message.
///
/// Rejections are expected states the caller branches on (insufficient
/// tokens, wager already resolved, ...), not faults. System-level failures
/// travel on the `Result` error channel instead; the two must never be
/// conflated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The operation was applied; `value` is its payload.
    Accepted { value: T, message: String },

    /// A business rule rejected the operation. Nothing was applied.
    Rejected { message: String },
}

impl<T> Outcome<T> {
    /// Creates an accepted outcome.
    pub fn accepted(value: T, message: impl Into<String>) -> Self {
        Outcome::Accepted {
            value,
            message: message.into(),
        }
    }

    /// Creates a rejected outcome.
    pub fn rejected(message: impl Into<String>) -> Self {
        Outcome::Rejected {
            message: message.into(),
        }
    }

    /// Returns true if the operation was applied.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    /// Returns true if a business rule rejected the operation.
    pub fn is_rejected(&self) -> bool {
        !self.is_accepted()
    }

    /// Returns the user-facing message.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Accepted { message, .. } | Outcome::Rejected { message } => message,
        }
    }

    /// Returns the payload if accepted.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Accepted { value, .. } => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }

    /// Consumes the outcome, returning the payload if accepted.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Accepted { value, .. } => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }

    /// Maps the payload of an accepted outcome, preserving the message.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Accepted { value, message } => Outcome::Accepted {
                value: f(value),
                message,
            },
            Outcome::Rejected { message } => Outcome::Rejected { message },
        }
    }
}
