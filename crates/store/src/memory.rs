//! In-memory store implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{SessionId, Tokens, UserId, WagerId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::records::{SessionRecord, UserAccount, WagerRecord};
use crate::store::{GameStore, StoreTx};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, UserAccount>,
    sessions: HashMap<SessionId, SessionRecord>,
    wagers: HashMap<WagerId, WagerRecord>,
}

/// In-memory store backed by a single mutex.
///
/// `begin` takes the lock for the whole transaction, so transactions
/// serialize; writes go to a scratch copy that replaces the shared state
/// on commit. This gives the same all-or-nothing visibility as the
/// PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user account directly, returning its ID.
    ///
    /// Test convenience; account provisioning is outside the wager core.
    pub async fn seed_user(&self, username: &str, balance: Tokens) -> UserId {
        let account = UserAccount::new(username, balance);
        let id = account.id;
        self.state.lock().await.users.insert(id, account);
        id
    }

    /// Returns the number of stored wagers.
    pub async fn wager_count(&self) -> usize {
        self.state.lock().await.wagers.len()
    }

    /// Returns the number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let scratch = guard.clone();
        Ok(MemoryTx { guard, scratch })
    }
}

/// An in-memory transaction.
///
/// Holds the store lock for its whole lifetime and mutates a scratch copy
/// of the state; `commit` swaps the scratch back in.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    scratch: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_user(&mut self, id: UserId) -> Result<Option<UserAccount>> {
        Ok(self.scratch.users.get(&id).cloned())
    }

    async fn save_user(&mut self, user: &UserAccount) -> Result<()> {
        self.scratch.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_session(&mut self, id: SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.scratch.sessions.get(&id).cloned())
    }

    async fn insert_session(&mut self, session: &SessionRecord) -> Result<()> {
        if self.scratch.sessions.contains_key(&session.id) {
            return Err(StoreError::Conflict(format!(
                "session {} already exists",
                session.id
            )));
        }
        self.scratch.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn save_session(&mut self, session: &SessionRecord) -> Result<()> {
        self.scratch.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn delete_session(&mut self, id: SessionId) -> Result<()> {
        self.scratch.sessions.remove(&id);
        Ok(())
    }

    async fn find_wager_by_session(
        &mut self,
        session_id: SessionId,
    ) -> Result<Option<WagerRecord>> {
        Ok(self
            .scratch
            .wagers
            .values()
            .find(|w| w.session_id == session_id)
            .cloned())
    }

    async fn insert_wager(&mut self, wager: &WagerRecord) -> Result<()> {
        if self
            .scratch
            .wagers
            .values()
            .any(|w| w.session_id == wager.session_id)
        {
            return Err(StoreError::Conflict(format!(
                "wager already exists for session {}",
                wager.session_id
            )));
        }
        self.scratch.wagers.insert(wager.id, wager.clone());
        Ok(())
    }

    async fn save_wager(&mut self, wager: &WagerRecord) -> Result<()> {
        self.scratch.wagers.insert(wager.id, wager.clone());
        Ok(())
    }

    async fn wagers_for_user(&mut self, user: UserId, limit: usize) -> Result<Vec<WagerRecord>> {
        let mut wagers: Vec<_> = self
            .scratch
            .wagers
            .values()
            .filter(|w| w.is_participant(user))
            .cloned()
            .collect();
        wagers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        wagers.truncate(limit);
        Ok(wagers)
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.scratch;
        Ok(())
    }
}
