//! Session orchestrator service.

use common::{Outcome, SessionId, Tokens, UserId};
use ledger::TokenLedger;
use store::{GameMode, GameStore, SessionRecord, StoreTx, WagerRecord};
use wager::{CreateWager, WagerCoordinator, WagerDetails};

use crate::error::{Result, SessionError};

/// Command to create a game session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub mode: GameMode,
    pub category: String,
    /// Required for multiplayer and wagered games.
    pub player_two: Option<UserId>,
    /// Required for wagered games; the per-player stake.
    pub wager_amount: Option<Tokens>,
}

impl CreateSession {
    /// A single-player session in the given category.
    pub fn single_player(category: impl Into<String>) -> Self {
        Self {
            mode: GameMode::SinglePlayer,
            category: category.into(),
            player_two: None,
            wager_amount: None,
        }
    }

    /// An unwagered head-to-head session.
    pub fn multiplayer(category: impl Into<String>, opponent: UserId) -> Self {
        Self {
            mode: GameMode::Multiplayer,
            category: category.into(),
            player_two: Some(opponent),
            wager_amount: None,
        }
    }

    /// A wagered session staking `amount` tokens per player.
    pub fn wagered(category: impl Into<String>, opponent: UserId, amount: Tokens) -> Self {
        Self {
            mode: GameMode::Wagered,
            category: category.into(),
            player_two: Some(opponent),
            wager_amount: Some(amount),
        }
    }
}

/// The result of completing a wagered game.
#[derive(Debug, Clone)]
pub struct CompletedGame {
    pub session: SessionRecord,
    /// User-facing result line, e.g. `"alice wins! You won 20 tokens!"`.
    pub message: String,
}

/// Orchestrates game sessions and drives their wagers through the
/// coordinator.
///
/// The orchestrator converts the coordinator's soft rejections into hard
/// errors at its own boundary: a session that cannot be created or
/// completed is a failure to its callers. When staking fails after the
/// session row was created, the session is deleted again (compensating
/// rollback) so no unstaked wagered session is left ready to play.
pub struct SessionOrchestrator<S, L>
where
    S: GameStore,
    L: TokenLedger<Tx = S::Tx> + Clone,
{
    store: S,
    ledger: L,
    wagers: WagerCoordinator<S, L>,
}

impl<S, L> SessionOrchestrator<S, L>
where
    S: GameStore,
    L: TokenLedger<Tx = S::Tx> + Clone,
{
    /// Creates a new session orchestrator.
    pub fn new(store: S, ledger: L) -> Self {
        let wagers = WagerCoordinator::new(store.clone(), ledger.clone());
        Self {
            store,
            ledger,
            wagers,
        }
    }

    /// Creates a game session for `creator`.
    ///
    /// Wagered sessions verify both players can cover the stake, persist
    /// the session, then create the wager. If the coordinator rejects the
    /// wager the session is deleted again and the rejection surfaces as
    /// [`SessionError::WagerSetup`].
    #[tracing::instrument(skip(self))]
    pub async fn create_session(
        &self,
        cmd: CreateSession,
        creator: UserId,
    ) -> Result<SessionRecord> {
        let mut tx = self.store.begin().await?;
        let creator_account = tx
            .find_user(creator)
            .await?
            .ok_or(SessionError::PlayerNotFound(creator))?;

        if cmd.mode == GameMode::SinglePlayer {
            let session = SessionRecord::new(creator, None, cmd.mode, cmd.category, None);
            tx.insert_session(&session).await?;
            tx.commit().await?;
            metrics::counter!("sessions_created_total").increment(1);
            return Ok(session);
        }

        let opponent_id = cmd.player_two.ok_or(SessionError::OpponentRequired)?;
        let opponent = tx
            .find_user(opponent_id)
            .await?
            .ok_or(SessionError::PlayerNotFound(opponent_id))?;
        if opponent_id == creator {
            return Err(SessionError::SelfPlay);
        }

        let wager_amount = if cmd.mode == GameMode::Wagered {
            let amount = cmd.wager_amount.ok_or(SessionError::InvalidWagerAmount)?;
            if !amount.is_positive() {
                return Err(SessionError::InvalidWagerAmount);
            }
            if !self
                .ledger
                .has_sufficient_tokens(&mut tx, creator, amount)
                .await?
            {
                return Err(SessionError::InsufficientTokens {
                    username: creator_account.username,
                });
            }
            if !self
                .ledger
                .has_sufficient_tokens(&mut tx, opponent_id, amount)
                .await?
            {
                return Err(SessionError::InsufficientTokens {
                    username: opponent.username,
                });
            }
            Some(amount)
        } else {
            None
        };

        let session = SessionRecord::new(
            creator,
            Some(opponent_id),
            cmd.mode,
            cmd.category,
            wager_amount,
        );
        tx.insert_session(&session).await?;
        tx.commit().await?;
        metrics::counter!("sessions_created_total").increment(1);

        if let Some(amount) = wager_amount {
            let outcome = self
                .wagers
                .create_wager(CreateWager::new(session.id, creator, opponent_id, amount))
                .await?;

            if let Outcome::Rejected { message } = outcome {
                // Compensating rollback: the session must not remain
                // ready to play with an unstaked wager.
                let mut tx = self.store.begin().await?;
                tx.delete_session(session.id).await?;
                tx.commit().await?;
                tracing::warn!(
                    session_id = %session.id,
                    reason = %message,
                    "wager setup rejected, session rolled back"
                );
                return Err(SessionError::WagerSetup(message));
            }
        }

        tracing::info!(session_id = %session.id, mode = %session.mode, "session created");
        Ok(session)
    }

    /// Completes a wagered game with the final scores, settling its wager.
    ///
    /// The wager resolves first; if the coordinator rejects the
    /// resolution, the completion fails and no scores are persisted, so a
    /// session is never completed while its wager remains staked.
    #[tracing::instrument(skip(self))]
    pub async fn complete_wagered_game(
        &self,
        session_id: SessionId,
        score_a: i32,
        score_b: i32,
    ) -> Result<CompletedGame> {
        let mut tx = self.store.begin().await?;
        let mut session = tx
            .find_session(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound(session_id))?;

        if !session.has_wager {
            return Err(SessionError::NotWagered(session_id));
        }
        if !session.status.can_complete() {
            return Err(SessionError::AlreadyCompleted(session_id));
        }
        let player_two = session
            .player_two
            .ok_or(SessionError::OpponentRequired)?;
        drop(tx);

        let winner = if score_a > score_b {
            Some(session.player_one)
        } else if score_a < score_b {
            Some(player_two)
        } else {
            None
        };

        let (message, winner) = match winner {
            Some(winner_id) => {
                let outcome = self
                    .wagers
                    .resolve_wager_with_winner(session_id, winner_id)
                    .await?;
                let payout = match outcome {
                    Outcome::Accepted { message, .. } => message,
                    Outcome::Rejected { message } => {
                        return Err(SessionError::WagerResolution(message));
                    }
                };

                let mut tx = self.store.begin().await?;
                let account = tx
                    .find_user(winner_id)
                    .await?
                    .ok_or(SessionError::PlayerNotFound(winner_id))?;
                drop(tx);

                (format!("{} wins! {payout}", account.username), Some(winner_id))
            }
            None => {
                let outcome = self.wagers.resolve_wager_as_draw(session_id).await?;
                let wager = match outcome {
                    Outcome::Accepted { value, .. } => value,
                    Outcome::Rejected { message } => {
                        return Err(SessionError::WagerResolution(message));
                    }
                };

                (
                    format!(
                        "It's a draw! Each player's stake of {} tokens was refunded",
                        wager.amount
                    ),
                    None,
                )
            }
        };

        session.complete(score_a, score_b, winner);
        let mut tx = self.store.begin().await?;
        tx.save_session(&session).await?;
        tx.commit().await?;

        metrics::counter!("sessions_completed_total").increment(1);
        tracing::info!(%session_id, %message, "wagered game completed");

        Ok(CompletedGame { session, message })
    }

    /// Reads a user's current token balance.
    #[tracing::instrument(skip(self))]
    pub async fn user_token_balance(&self, user: UserId) -> Result<Tokens> {
        let mut tx = self.store.begin().await?;
        Ok(self.ledger.balance_of(&mut tx, user).await?)
    }

    /// Looks up the wager attached to a session, if any.
    #[tracing::instrument(skip(self))]
    pub async fn session_wager(&self, session_id: SessionId) -> Result<Option<WagerDetails>> {
        Ok(self.wagers.wager_for_session(session_id).await?)
    }

    /// Lists a user's wagers, most recent first. Fails open to an empty
    /// list on storage errors.
    #[tracing::instrument(skip(self))]
    pub async fn user_wagers(&self, user: UserId, limit: usize) -> Vec<WagerRecord> {
        self.wagers.wagers_for_user(user, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger::AccountLedger;
    use store::{MemoryStore, SessionStatus};

    async fn setup() -> (
        SessionOrchestrator<MemoryStore, AccountLedger<MemoryStore>>,
        MemoryStore,
        UserId,
    ) {
        let store = MemoryStore::new();
        let creator = store.seed_user("alice", Tokens::new(100)).await;
        let orchestrator =
            SessionOrchestrator::new(store.clone(), AccountLedger::new(store.clone()));
        (orchestrator, store, creator)
    }

    #[tokio::test]
    async fn single_player_session_skips_wager_logic() {
        let (orchestrator, store, creator) = setup().await;

        let session = orchestrator
            .create_session(CreateSession::single_player("science"), creator)
            .await
            .unwrap();

        assert_eq!(session.mode, GameMode::SinglePlayer);
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(!session.has_wager);
        assert_eq!(store.wager_count().await, 0);
    }

    #[tokio::test]
    async fn self_play_is_rejected() {
        let (orchestrator, _, creator) = setup().await;

        let result = orchestrator
            .create_session(
                CreateSession::wagered("history", creator, Tokens::new(10)),
                creator,
            )
            .await;
        assert!(matches!(result, Err(SessionError::SelfPlay)));
    }

    #[tokio::test]
    async fn missing_opponent_is_a_hard_not_found() {
        let (orchestrator, _, creator) = setup().await;
        let ghost = UserId::new();

        let result = orchestrator
            .create_session(CreateSession::multiplayer("history", ghost), creator)
            .await;
        assert!(matches!(result, Err(SessionError::PlayerNotFound(id)) if id == ghost));
    }

    #[tokio::test]
    async fn wagered_session_requires_a_positive_amount() {
        let (orchestrator, store, creator) = setup().await;
        let opponent = store.seed_user("bob", Tokens::new(100)).await;

        let result = orchestrator
            .create_session(
                CreateSession::wagered("history", opponent, Tokens::ZERO),
                creator,
            )
            .await;
        assert!(matches!(result, Err(SessionError::InvalidWagerAmount)));

        let mut cmd = CreateSession::wagered("history", opponent, Tokens::new(10));
        cmd.wager_amount = None;
        let result = orchestrator.create_session(cmd, creator).await;
        assert!(matches!(result, Err(SessionError::InvalidWagerAmount)));
    }
}
