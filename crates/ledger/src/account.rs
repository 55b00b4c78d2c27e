//! The token ledger trait and its account-store implementation.

use async_trait::async_trait;
use common::{Outcome, Tokens, UserId};
use store::{GameStore, StoreTx};

use crate::error::{LedgerError, Result};

/// Capability interface for token balance movement.
///
/// Every operation runs against a caller-supplied store transaction, so a
/// caller holding a wider unit of work (staking two players plus a wager
/// insert, say) keeps all of it atomic. The ledger performs no retry
/// deduplication; at-most-once settlement is the wager coordinator's job
/// via its status guards.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// The transaction type the ledger operates within.
    type Tx: StoreTx;

    /// Returns true if the user exists and holds at least `amount` tokens.
    ///
    /// A missing user is `false`, not an error.
    async fn has_sufficient_tokens(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        amount: Tokens,
    ) -> Result<bool>;

    /// Reads the current balance. Fails hard when the user is missing.
    async fn balance_of(&self, tx: &mut Self::Tx, user: UserId) -> Result<Tokens>;

    /// Deducts `amount` from the user's balance.
    ///
    /// Re-reads the balance inside the transaction; rejects softly when the
    /// user is missing or short. Accepted outcomes carry the new balance.
    async fn stake_tokens(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        amount: Tokens,
    ) -> Result<Outcome<Tokens>>;

    /// Credits the full pot to the winning player.
    async fn release_to_winner(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        total: Tokens,
    ) -> Result<Outcome<Tokens>>;

    /// Returns a player's own stake after a draw.
    async fn refund_stake(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        amount: Tokens,
    ) -> Result<Outcome<Tokens>>;
}

/// Ledger over the user accounts of a [`GameStore`].
#[derive(Clone)]
pub struct AccountLedger<S: GameStore> {
    store: S,
}

impl<S: GameStore> AccountLedger<S> {
    /// Creates a ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // Single-call forms that open and commit their own transaction. These
    // are the ledger's independent public surface; multi-step callers use
    // the trait methods with a shared transaction instead.

    /// Reads a balance in its own transaction.
    #[tracing::instrument(skip(self))]
    pub async fn balance(&self, user: UserId) -> Result<Tokens> {
        let mut tx = self.store.begin().await?;
        self.balance_of(&mut tx, user).await
    }

    /// Checks sufficiency in its own transaction.
    #[tracing::instrument(skip(self))]
    pub async fn sufficient(&self, user: UserId, amount: Tokens) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        self.has_sufficient_tokens(&mut tx, user, amount).await
    }

    /// Stakes in its own transaction; commits only on acceptance.
    #[tracing::instrument(skip(self))]
    pub async fn stake(&self, user: UserId, amount: Tokens) -> Result<Outcome<Tokens>> {
        let mut tx = self.store.begin().await?;
        let outcome = self.stake_tokens(&mut tx, user, amount).await?;
        if outcome.is_accepted() {
            tx.commit().await?;
        }
        Ok(outcome)
    }

    /// Releases a pot in its own transaction; commits only on acceptance.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, user: UserId, total: Tokens) -> Result<Outcome<Tokens>> {
        let mut tx = self.store.begin().await?;
        let outcome = self.release_to_winner(&mut tx, user, total).await?;
        if outcome.is_accepted() {
            tx.commit().await?;
        }
        Ok(outcome)
    }

    /// Refunds a stake in its own transaction; commits only on acceptance.
    #[tracing::instrument(skip(self))]
    pub async fn refund(&self, user: UserId, amount: Tokens) -> Result<Outcome<Tokens>> {
        let mut tx = self.store.begin().await?;
        let outcome = self.refund_stake(&mut tx, user, amount).await?;
        if outcome.is_accepted() {
            tx.commit().await?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<S: GameStore> TokenLedger for AccountLedger<S> {
    type Tx = S::Tx;

    async fn has_sufficient_tokens(
        &self,
        tx: &mut S::Tx,
        user: UserId,
        amount: Tokens,
    ) -> Result<bool> {
        match tx.find_user(user).await? {
            Some(account) => Ok(account.balance >= amount),
            None => Ok(false),
        }
    }

    async fn balance_of(&self, tx: &mut S::Tx, user: UserId) -> Result<Tokens> {
        let account = tx
            .find_user(user)
            .await?
            .ok_or(LedgerError::UserNotFound(user))?;
        Ok(account.balance)
    }

    async fn stake_tokens(
        &self,
        tx: &mut S::Tx,
        user: UserId,
        amount: Tokens,
    ) -> Result<Outcome<Tokens>> {
        let Some(mut account) = tx.find_user(user).await? else {
            return Ok(Outcome::rejected(format!("User with ID {user} not found")));
        };

        let Some(new_balance) = account.balance.checked_sub(amount) else {
            tracing::debug!(%user, %amount, balance = %account.balance, "stake rejected");
            return Ok(Outcome::rejected(format!(
                "Insufficient tokens: balance is {}, required {amount}",
                account.balance
            )));
        };

        account.balance = new_balance;
        tx.save_user(&account).await?;
        metrics::counter!("ledger_stakes_total").increment(1);
        tracing::debug!(%user, %amount, %new_balance, "tokens staked");

        Ok(Outcome::accepted(
            new_balance,
            format!("Staked {amount} tokens. New balance: {new_balance}"),
        ))
    }

    async fn release_to_winner(
        &self,
        tx: &mut S::Tx,
        user: UserId,
        total: Tokens,
    ) -> Result<Outcome<Tokens>> {
        let Some(mut account) = tx.find_user(user).await? else {
            return Ok(Outcome::rejected(format!("User with ID {user} not found")));
        };

        account.balance += total;
        tx.save_user(&account).await?;
        metrics::counter!("ledger_releases_total").increment(1);
        tracing::debug!(%user, %total, new_balance = %account.balance, "pot released to winner");

        Ok(Outcome::accepted(
            account.balance,
            format!("You won {total} tokens!"),
        ))
    }

    async fn refund_stake(
        &self,
        tx: &mut S::Tx,
        user: UserId,
        amount: Tokens,
    ) -> Result<Outcome<Tokens>> {
        let Some(mut account) = tx.find_user(user).await? else {
            return Ok(Outcome::rejected(format!("User with ID {user} not found")));
        };

        account.balance += amount;
        tx.save_user(&account).await?;
        metrics::counter!("ledger_refunds_total").increment(1);
        tracing::debug!(%user, %amount, new_balance = %account.balance, "stake refunded");

        Ok(Outcome::accepted(
            account.balance,
            format!("Refunded {amount} tokens. New balance: {}", account.balance),
        ))
    }
}
