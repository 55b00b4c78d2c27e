//! End-to-end session lifecycle tests over the in-memory store.

use async_trait::async_trait;
use common::{Outcome, Tokens, UserId};
use ledger::{AccountLedger, LedgerError, TokenLedger};
use session::{CreateSession, SessionError, SessionOrchestrator};
use store::{GameStore, MemoryStore, MemoryTx, SessionStatus, StoreTx, WagerStatus};
use wager::WagerCoordinator;

struct Fixture {
    store: MemoryStore,
    orchestrator: SessionOrchestrator<MemoryStore, AccountLedger<MemoryStore>>,
    alice: UserId,
    bob: UserId,
}

async fn setup(alice_balance: i64, bob_balance: i64) -> Fixture {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", Tokens::new(alice_balance)).await;
    let bob = store.seed_user("bob", Tokens::new(bob_balance)).await;
    let orchestrator = SessionOrchestrator::new(store.clone(), AccountLedger::new(store.clone()));
    Fixture {
        store,
        orchestrator,
        alice,
        bob,
    }
}

#[tokio::test]
async fn wagered_lifecycle_pays_the_winner() {
    let f = setup(100, 100).await;

    let session = f
        .orchestrator
        .create_session(
            CreateSession::wagered("history", f.bob, Tokens::new(10)),
            f.alice,
        )
        .await
        .unwrap();

    assert!(session.has_wager);
    assert_eq!(session.wager_amount, Some(Tokens::new(10)));
    assert_eq!(
        f.orchestrator.user_token_balance(f.alice).await.unwrap(),
        Tokens::new(90)
    );
    assert_eq!(
        f.orchestrator.user_token_balance(f.bob).await.unwrap(),
        Tokens::new(90)
    );

    let completed = f
        .orchestrator
        .complete_wagered_game(session.id, 5, 3)
        .await
        .unwrap();

    assert_eq!(completed.message, "alice wins! You won 20 tokens!");
    assert_eq!(completed.session.status, SessionStatus::Completed);
    assert_eq!(completed.session.score, 5);
    assert_eq!(completed.session.player_two_score, 3);
    assert_eq!(completed.session.winner, Some(f.alice));

    assert_eq!(
        f.orchestrator.user_token_balance(f.alice).await.unwrap(),
        Tokens::new(110)
    );
    assert_eq!(
        f.orchestrator.user_token_balance(f.bob).await.unwrap(),
        Tokens::new(90)
    );

    let details = f
        .orchestrator
        .session_wager(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.wager.status, WagerStatus::Won);
    assert_eq!(details.winner.map(|w| w.id), Some(f.alice));
}

#[tokio::test]
async fn drawn_game_refunds_both_stakes() {
    let f = setup(100, 100).await;

    let session = f
        .orchestrator
        .create_session(
            CreateSession::wagered("science", f.bob, Tokens::new(25)),
            f.alice,
        )
        .await
        .unwrap();

    let completed = f
        .orchestrator
        .complete_wagered_game(session.id, 4, 4)
        .await
        .unwrap();

    assert_eq!(
        completed.message,
        "It's a draw! Each player's stake of 25 tokens was refunded"
    );
    assert_eq!(completed.session.winner, None);

    assert_eq!(
        f.orchestrator.user_token_balance(f.alice).await.unwrap(),
        Tokens::new(100)
    );
    assert_eq!(
        f.orchestrator.user_token_balance(f.bob).await.unwrap(),
        Tokens::new(100)
    );

    let details = f
        .orchestrator
        .session_wager(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.wager.status, WagerStatus::Refunded);
    assert!(details.winner.is_none());
}

#[tokio::test]
async fn a_completed_game_cannot_be_completed_again() {
    let f = setup(100, 100).await;

    let session = f
        .orchestrator
        .create_session(
            CreateSession::wagered("history", f.bob, Tokens::new(10)),
            f.alice,
        )
        .await
        .unwrap();

    f.orchestrator
        .complete_wagered_game(session.id, 5, 3)
        .await
        .unwrap();

    let result = f.orchestrator.complete_wagered_game(session.id, 3, 5).await;
    assert!(matches!(result, Err(SessionError::AlreadyCompleted(id)) if id == session.id));

    // The pot was paid exactly once.
    assert_eq!(
        f.orchestrator.user_token_balance(f.alice).await.unwrap(),
        Tokens::new(110)
    );
    assert_eq!(
        f.orchestrator.user_token_balance(f.bob).await.unwrap(),
        Tokens::new(90)
    );

    // The original scores survived the second attempt.
    let mut tx = f.store.begin().await.unwrap();
    let stored = tx.find_session(session.id).await.unwrap().unwrap();
    assert_eq!((stored.score, stored.player_two_score), (5, 3));
}

#[tokio::test]
async fn completion_fails_when_the_wager_was_already_settled() {
    let f = setup(100, 100).await;

    let session = f
        .orchestrator
        .create_session(
            CreateSession::wagered("history", f.bob, Tokens::new(10)),
            f.alice,
        )
        .await
        .unwrap();

    // Settle the wager out from under the session.
    let coordinator =
        WagerCoordinator::new(f.store.clone(), AccountLedger::new(f.store.clone()));
    let settled = coordinator
        .resolve_wager_with_winner(session.id, f.bob)
        .await
        .unwrap();
    assert!(settled.is_accepted());

    let result = f.orchestrator.complete_wagered_game(session.id, 5, 3).await;
    assert!(matches!(
        result,
        Err(SessionError::WagerResolution(ref msg)) if msg.contains("already been resolved")
    ));

    // No completion was persisted.
    let mut tx = f.store.begin().await.unwrap();
    let stored = tx.find_session(session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::InProgress);
    assert_eq!(stored.winner, None);
}

#[tokio::test]
async fn completing_an_unwagered_session_persists_nothing() {
    let f = setup(100, 100).await;

    let session = f
        .orchestrator
        .create_session(CreateSession::multiplayer("geography", f.bob), f.alice)
        .await
        .unwrap();

    let result = f.orchestrator.complete_wagered_game(session.id, 7, 2).await;
    assert!(matches!(result, Err(SessionError::NotWagered(id)) if id == session.id));

    let mut tx = f.store.begin().await.unwrap();
    let stored = tx.find_session(session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::InProgress);
    assert_eq!((stored.score, stored.player_two_score), (0, 0));
}

#[tokio::test]
async fn completing_a_missing_session_is_not_found() {
    let f = setup(100, 100).await;

    let ghost = common::SessionId::new();
    let result = f.orchestrator.complete_wagered_game(ghost, 1, 0).await;
    assert!(matches!(result, Err(SessionError::SessionNotFound(id)) if id == ghost));

    assert!(f.orchestrator.session_wager(ghost).await.unwrap().is_none());
}

#[tokio::test]
async fn insufficient_funds_fail_before_the_session_exists() {
    let f = setup(5, 100).await;

    let result = f
        .orchestrator
        .create_session(
            CreateSession::wagered("history", f.bob, Tokens::new(10)),
            f.alice,
        )
        .await;

    assert!(matches!(
        result,
        Err(SessionError::InsufficientTokens { ref username }) if username == "alice"
    ));
    assert_eq!(f.store.session_count().await, 0);
    assert_eq!(f.store.wager_count().await, 0);
}

/// A ledger that reports every balance as sufficient, forcing the
/// insufficiency to surface at staking time instead of the orchestrator's
/// pre-flight check.
#[derive(Clone)]
struct OptimisticLedger(AccountLedger<MemoryStore>);

#[async_trait]
impl TokenLedger for OptimisticLedger {
    type Tx = MemoryTx;

    async fn has_sufficient_tokens(
        &self,
        _tx: &mut MemoryTx,
        _user: UserId,
        _amount: Tokens,
    ) -> ledger::Result<bool> {
        Ok(true)
    }

    async fn balance_of(&self, tx: &mut MemoryTx, user: UserId) -> ledger::Result<Tokens> {
        self.0.balance_of(tx, user).await
    }

    async fn stake_tokens(
        &self,
        tx: &mut MemoryTx,
        user: UserId,
        amount: Tokens,
    ) -> ledger::Result<Outcome<Tokens>> {
        self.0.stake_tokens(tx, user, amount).await
    }

    async fn release_to_winner(
        &self,
        tx: &mut MemoryTx,
        user: UserId,
        total: Tokens,
    ) -> ledger::Result<Outcome<Tokens>> {
        self.0.release_to_winner(tx, user, total).await
    }

    async fn refund_stake(
        &self,
        tx: &mut MemoryTx,
        user: UserId,
        amount: Tokens,
    ) -> ledger::Result<Outcome<Tokens>> {
        self.0.refund_stake(tx, user, amount).await
    }
}

#[tokio::test]
async fn failed_staking_deletes_the_session_again() {
    let store = MemoryStore::new();
    let alice = store.seed_user("alice", Tokens::new(5)).await;
    let bob = store.seed_user("bob", Tokens::new(100)).await;
    let ledger = OptimisticLedger(AccountLedger::new(store.clone()));
    let orchestrator = SessionOrchestrator::new(store.clone(), ledger);

    let result = orchestrator
        .create_session(CreateSession::wagered("history", bob, Tokens::new(10)), alice)
        .await;

    assert!(matches!(
        result,
        Err(SessionError::WagerSetup(ref msg)) if msg.contains("Insufficient tokens")
    ));

    // The compensating delete removed the session, and nothing was staked.
    assert_eq!(store.session_count().await, 0);
    assert_eq!(store.wager_count().await, 0);
    assert_eq!(
        orchestrator.user_token_balance(alice).await.unwrap(),
        Tokens::new(5)
    );
    assert_eq!(
        orchestrator.user_token_balance(bob).await.unwrap(),
        Tokens::new(100)
    );
}

#[tokio::test]
async fn wager_listing_spans_sessions_most_recent_first() {
    let f = setup(100, 100).await;

    let first = f
        .orchestrator
        .create_session(
            CreateSession::wagered("history", f.bob, Tokens::new(10)),
            f.alice,
        )
        .await
        .unwrap();
    let second = f
        .orchestrator
        .create_session(
            CreateSession::wagered("science", f.bob, Tokens::new(20)),
            f.alice,
        )
        .await
        .unwrap();

    let wagers = f.orchestrator.user_wagers(f.alice, 10).await;
    assert_eq!(wagers.len(), 2);
    assert_eq!(wagers[0].session_id, second.id);
    assert_eq!(wagers[1].session_id, first.id);

    let limited = f.orchestrator.user_wagers(f.alice, 1).await;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].session_id, second.id);
}

#[tokio::test]
async fn balance_lookup_for_a_missing_user_is_a_hard_error() {
    let f = setup(100, 100).await;

    let result = f.orchestrator.user_token_balance(UserId::new()).await;
    assert!(matches!(
        result,
        Err(SessionError::Ledger(LedgerError::UserNotFound(_)))
    ));
}
