//! Store and transaction traits.

use async_trait::async_trait;
use common::{SessionId, UserId};

use crate::Result;
use crate::records::{SessionRecord, UserAccount, WagerRecord};

/// A handle to a store that can open transactions.
///
/// Implementations are cheap to clone (they share the underlying state or
/// connection pool) so each service holds its own copy.
#[async_trait]
pub trait GameStore: Clone + Send + Sync + 'static {
    /// The transaction type this store produces.
    type Tx: StoreTx;

    /// Begins a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A single atomic unit of work.
///
/// All reads within a transaction observe a consistent snapshot, and all
/// writes become visible together on [`StoreTx::commit`]. Dropping the
/// transaction without committing discards every write, so `?`-propagated
/// errors roll back automatically.
///
/// Single-record reads (`find_user`, `find_session`,
/// `find_wager_by_session`) hold the record exclusively for the rest of
/// the transaction. Two transactions that read-modify-write the same
/// record therefore serialize: the second read observes the first
/// transaction's committed write, never the value it started from.
#[async_trait]
pub trait StoreTx: Send {
    // Users

    /// Looks up a user account by ID.
    async fn find_user(&mut self, id: UserId) -> Result<Option<UserAccount>>;

    /// Writes a user account back, overwriting the stored row.
    async fn save_user(&mut self, user: &UserAccount) -> Result<()>;

    // Sessions

    /// Looks up a game session by ID.
    async fn find_session(&mut self, id: SessionId) -> Result<Option<SessionRecord>>;

    /// Inserts a new game session. Fails with [`crate::StoreError::Conflict`]
    /// if the ID is already taken.
    async fn insert_session(&mut self, session: &SessionRecord) -> Result<()>;

    /// Writes an existing game session back.
    async fn save_session(&mut self, session: &SessionRecord) -> Result<()>;

    /// Deletes a game session. Deleting a missing session is a no-op.
    async fn delete_session(&mut self, id: SessionId) -> Result<()>;

    // Wagers

    /// Looks up the wager tied to a session, if any.
    async fn find_wager_by_session(&mut self, session_id: SessionId)
    -> Result<Option<WagerRecord>>;

    /// Inserts a new wager. Fails with [`crate::StoreError::Conflict`] if a
    /// wager already exists for the same session; this uniqueness constraint
    /// is what makes concurrent duplicate creation safe.
    async fn insert_wager(&mut self, wager: &WagerRecord) -> Result<()>;

    /// Writes an existing wager back.
    async fn save_wager(&mut self, wager: &WagerRecord) -> Result<()>;

    /// Returns up to `limit` wagers the user participated in, most recent
    /// first.
    async fn wagers_for_user(&mut self, user: UserId, limit: usize) -> Result<Vec<WagerRecord>>;

    /// Commits the transaction, publishing all of its writes atomically.
    async fn commit(self) -> Result<()>;
}
