//! Wager coordinator service.

use common::{Outcome, SessionId, Tokens, UserId};
use ledger::TokenLedger;
use store::{GameStore, StoreError, StoreTx, UserAccount, WagerRecord};

use crate::error::{Result, WagerError};

/// Command to create a wager between two players for a session.
#[derive(Debug, Clone)]
pub struct CreateWager {
    pub session_id: SessionId,
    pub player_a: UserId,
    pub player_b: UserId,
    /// Per-player stake; both players stake the same amount.
    pub amount: Tokens,
}

impl CreateWager {
    /// Creates a new wager command.
    pub fn new(session_id: SessionId, player_a: UserId, player_b: UserId, amount: Tokens) -> Self {
        Self {
            session_id,
            player_a,
            player_b,
            amount,
        }
    }
}

/// A wager with its related player accounts attached.
#[derive(Debug, Clone)]
pub struct WagerDetails {
    pub wager: WagerRecord,
    pub player_a: UserAccount,
    pub player_b: UserAccount,
    /// Present when the wager has been won.
    pub winner: Option<UserAccount>,
}

/// Drives the wager lifecycle: create with both stakes held, then resolve
/// exactly once to a winner or as a draw.
///
/// Every mutation runs inside one store transaction shared with the
/// ledger, so either the whole step commits (both stakes plus the wager
/// row; payout plus the status change) or none of it does. Business-rule
/// rejections come back as [`Outcome::Rejected`]; the error channel is for
/// storage and ledger faults only.
pub struct WagerCoordinator<S, L>
where
    S: GameStore,
    L: TokenLedger<Tx = S::Tx>,
{
    store: S,
    ledger: L,
}

impl<S, L> WagerCoordinator<S, L>
where
    S: GameStore,
    L: TokenLedger<Tx = S::Tx>,
{
    /// Creates a new wager coordinator.
    pub fn new(store: S, ledger: L) -> Self {
        Self { store, ledger }
    }

    /// Creates a wager: stakes both players and persists a `Staked` wager,
    /// all in one transaction.
    ///
    /// Rejects softly when a player is missing, a player cannot cover the
    /// stake (both players are checked before rejecting so the message can
    /// name either or both), or a wager already exists for the session.
    /// The existing-wager guard is backed by the store's uniqueness
    /// constraint, so a racing duplicate create loses at the insert and is
    /// reported the same way.
    #[tracing::instrument(skip(self))]
    pub async fn create_wager(&self, cmd: CreateWager) -> Result<Outcome<WagerRecord>> {
        if !cmd.amount.is_positive() {
            return Ok(Outcome::rejected(
                "Wager amount must be a positive number of tokens",
            ));
        }

        let mut tx = self.store.begin().await?;

        let Some(player_a) = tx.find_user(cmd.player_a).await? else {
            return Ok(Outcome::rejected(format!(
                "Player A with ID {} not found",
                cmd.player_a
            )));
        };
        let Some(player_b) = tx.find_user(cmd.player_b).await? else {
            return Ok(Outcome::rejected(format!(
                "Player B with ID {} not found",
                cmd.player_b
            )));
        };

        let a_covered = self
            .ledger
            .has_sufficient_tokens(&mut tx, cmd.player_a, cmd.amount)
            .await?;
        let b_covered = self
            .ledger
            .has_sufficient_tokens(&mut tx, cmd.player_b, cmd.amount)
            .await?;
        match (a_covered, b_covered) {
            (false, false) => {
                return Ok(Outcome::rejected(format!(
                    "{} and {} have insufficient tokens for a {} token wager",
                    player_a.username, player_b.username, cmd.amount
                )));
            }
            (false, true) => {
                return Ok(Outcome::rejected(format!(
                    "{} has insufficient tokens for a {} token wager",
                    player_a.username, cmd.amount
                )));
            }
            (true, false) => {
                return Ok(Outcome::rejected(format!(
                    "{} has insufficient tokens for a {} token wager",
                    player_b.username, cmd.amount
                )));
            }
            (true, true) => {}
        }

        if tx.find_wager_by_session(cmd.session_id).await?.is_some() {
            return Ok(Outcome::rejected("Wager already exists for this session"));
        }

        // Stake both players. A rejection drops the transaction, so no
        // partial stake is ever observable as a created wager.
        let staked_a = self
            .ledger
            .stake_tokens(&mut tx, cmd.player_a, cmd.amount)
            .await?;
        if let Outcome::Rejected { message } = staked_a {
            return Ok(Outcome::rejected(message));
        }
        let staked_b = self
            .ledger
            .stake_tokens(&mut tx, cmd.player_b, cmd.amount)
            .await?;
        if let Outcome::Rejected { message } = staked_b {
            return Ok(Outcome::rejected(message));
        }

        let wager = WagerRecord::new(cmd.session_id, cmd.player_a, cmd.player_b, cmd.amount);
        match tx.insert_wager(&wager).await {
            Err(StoreError::Conflict(_)) => {
                return Ok(Outcome::rejected("Wager already exists for this session"));
            }
            other => other?,
        }
        tx.commit().await?;

        metrics::counter!("wagers_created_total").increment(1);
        tracing::info!(
            wager_id = %wager.id,
            session_id = %wager.session_id,
            amount = %wager.amount,
            "wager created"
        );

        let message = format!(
            "Wager created: {} tokens staked by each player for a {} token pot",
            wager.amount, wager.total_pot
        );
        Ok(Outcome::accepted(wager, message))
    }

    /// Resolves a wager to a winner, releasing the full pot.
    ///
    /// The status is re-checked inside the resolving transaction, so a
    /// resolve racing a second resolve loses at the guard and nothing is
    /// paid twice.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_wager_with_winner(
        &self,
        session_id: SessionId,
        winner: UserId,
    ) -> Result<Outcome<WagerRecord>> {
        let mut tx = self.store.begin().await?;

        let Some(mut wager) = tx.find_wager_by_session(session_id).await? else {
            return Ok(Outcome::rejected(format!(
                "Wager for session {session_id} not found"
            )));
        };
        if !wager.status.can_resolve() {
            return Ok(Outcome::rejected(format!(
                "Wager for session {session_id} has already been resolved"
            )));
        }
        if !wager.is_participant(winner) {
            return Ok(Outcome::rejected(
                "Winner must be one of the wagering players",
            ));
        }

        let released = self
            .ledger
            .release_to_winner(&mut tx, winner, wager.total_pot)
            .await?;
        let message = match released {
            Outcome::Accepted { message, .. } => message,
            Outcome::Rejected { message } => return Ok(Outcome::rejected(message)),
        };

        wager.mark_won(winner, message.clone());
        tx.save_wager(&wager).await?;
        tx.commit().await?;

        metrics::counter!("wagers_won_total").increment(1);
        tracing::info!(wager_id = %wager.id, %session_id, %winner, "wager resolved to winner");

        Ok(Outcome::accepted(wager, message))
    }

    /// Resolves a wager as a draw, refunding each player their own stake.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_wager_as_draw(
        &self,
        session_id: SessionId,
    ) -> Result<Outcome<WagerRecord>> {
        let mut tx = self.store.begin().await?;

        let Some(mut wager) = tx.find_wager_by_session(session_id).await? else {
            return Ok(Outcome::rejected(format!(
                "Wager for session {session_id} not found"
            )));
        };
        if !wager.status.can_resolve() {
            return Ok(Outcome::rejected(format!(
                "Wager for session {session_id} has already been resolved"
            )));
        }

        // Each player gets their own stake back, not a share of the pot.
        let refund_a = self
            .ledger
            .refund_stake(&mut tx, wager.player_a, wager.amount)
            .await?;
        if let Outcome::Rejected { message } = refund_a {
            return Ok(Outcome::rejected(message));
        }
        let refund_b = self
            .ledger
            .refund_stake(&mut tx, wager.player_b, wager.amount)
            .await?;
        if let Outcome::Rejected { message } = refund_b {
            return Ok(Outcome::rejected(message));
        }

        let message = format!(
            "Draw! Each player's stake of {} tokens was refunded",
            wager.amount
        );
        wager.mark_refunded(message.clone());
        tx.save_wager(&wager).await?;
        tx.commit().await?;

        metrics::counter!("wagers_drawn_total").increment(1);
        tracing::info!(wager_id = %wager.id, %session_id, "wager resolved as draw");

        Ok(Outcome::accepted(wager, message))
    }

    /// Looks up the wager for a session with player and winner accounts
    /// attached. Returns `None` (not an error) when the session has no
    /// wager.
    #[tracing::instrument(skip(self))]
    pub async fn wager_for_session(&self, session_id: SessionId) -> Result<Option<WagerDetails>> {
        let mut tx = self.store.begin().await?;

        let Some(wager) = tx.find_wager_by_session(session_id).await? else {
            return Ok(None);
        };

        let player_a = tx
            .find_user(wager.player_a)
            .await?
            .ok_or(WagerError::PlayerRecordMissing(wager.player_a))?;
        let player_b = tx
            .find_user(wager.player_b)
            .await?
            .ok_or(WagerError::PlayerRecordMissing(wager.player_b))?;
        let winner = match wager.winner {
            Some(id) => Some(
                tx.find_user(id)
                    .await?
                    .ok_or(WagerError::PlayerRecordMissing(id))?,
            ),
            None => None,
        };

        Ok(Some(WagerDetails {
            wager,
            player_a,
            player_b,
            winner,
        }))
    }

    /// Lists a user's wagers, most recent first.
    ///
    /// Fails open: a storage error logs a warning and yields an empty list,
    /// since the listing is not worth failing a caller over.
    #[tracing::instrument(skip(self))]
    pub async fn wagers_for_user(&self, user: UserId, limit: usize) -> Vec<WagerRecord> {
        let result = async {
            let mut tx = self.store.begin().await?;
            tx.wagers_for_user(user, limit).await
        }
        .await;

        match result {
            Ok(wagers) => wagers,
            Err(e) => {
                tracing::warn!(%user, error = %e, "wager listing failed, returning empty");
                Vec::new()
            }
        }
    }
}
