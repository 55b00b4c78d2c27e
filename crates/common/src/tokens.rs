//! Token balance value object.

use serde::{Deserialize, Serialize};

/// An integer quantity of in-app tokens.
///
/// User balances are non-negative; that invariant is maintained by the
/// ledger, which is the only writer. The representation is `i64` so it
/// maps directly onto a Postgres `BIGINT` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Tokens(i64);

impl Tokens {
    /// Zero tokens.
    pub const ZERO: Tokens = Tokens(0);

    /// Creates a token quantity.
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns the raw token count.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the quantity is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the quantity is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts `other`, returning `None` if the result would be negative.
    pub fn checked_sub(&self, other: Tokens) -> Option<Tokens> {
        if self.0 >= other.0 {
            Some(Tokens(self.0 - other.0))
        } else {
            None
        }
    }

    /// Doubles the quantity (the pot of a two-player wager), saturating
    /// at `i64::MAX`.
    pub fn double(&self) -> Tokens {
        Tokens(self.0.saturating_mul(2))
    }
}

/// Addition saturates at `i64::MAX`; a balance or pot never wraps.
impl std::ops::Add for Tokens {
    type Output = Tokens;

    fn add(self, rhs: Tokens) -> Tokens {
        Tokens(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Tokens {
    fn add_assign(&mut self, rhs: Tokens) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::fmt::Display for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Tokens {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}
