//! PostgreSQL-backed store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{SessionId, Tokens, UserId, WagerId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::records::{GameMode, SessionRecord, SessionStatus, UserAccount, WagerRecord, WagerStatus};
use crate::store::{GameStore, StoreTx};
use crate::{Result, StoreError};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl GameStore for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTx { tx })
    }
}

/// A PostgreSQL transaction. Dropping it without commit rolls back.
///
/// Single-record reads select `FOR UPDATE`: the row stays locked until the
/// transaction ends, so two read-modify-write cycles against the same row
/// serialize instead of both acting on the same stale read.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn row_to_user(row: PgRow) -> Result<UserAccount> {
    Ok(UserAccount {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        username: row.try_get("username")?,
        balance: Tokens::new(row.try_get("balance")?),
    })
}

fn row_to_wager(row: PgRow) -> Result<WagerRecord> {
    let status: String = row.try_get("status")?;
    let status = WagerStatus::parse(&status).ok_or(StoreError::InvalidColumn {
        column: "status",
        value: status,
    })?;

    Ok(WagerRecord {
        id: WagerId::from_uuid(row.try_get::<Uuid, _>("id")?),
        session_id: SessionId::from_uuid(row.try_get::<Uuid, _>("session_id")?),
        player_a: UserId::from_uuid(row.try_get::<Uuid, _>("player_a")?),
        player_b: UserId::from_uuid(row.try_get::<Uuid, _>("player_b")?),
        amount: Tokens::new(row.try_get("amount")?),
        total_pot: Tokens::new(row.try_get("total_pot")?),
        status,
        winner: row.try_get::<Option<Uuid>, _>("winner")?.map(UserId::from_uuid),
        result_message: row.try_get("result_message")?,
        resolved_at: row.try_get::<Option<DateTime<Utc>>, _>("resolved_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_session(row: PgRow) -> Result<SessionRecord> {
    let mode: String = row.try_get("mode")?;
    let mode = GameMode::parse(&mode).ok_or(StoreError::InvalidColumn {
        column: "mode",
        value: mode,
    })?;
    let status: String = row.try_get("status")?;
    let status = SessionStatus::parse(&status).ok_or(StoreError::InvalidColumn {
        column: "status",
        value: status,
    })?;

    Ok(SessionRecord {
        id: SessionId::from_uuid(row.try_get::<Uuid, _>("id")?),
        player_one: UserId::from_uuid(row.try_get::<Uuid, _>("player_one")?),
        player_two: row
            .try_get::<Option<Uuid>, _>("player_two")?
            .map(UserId::from_uuid),
        mode,
        category: row.try_get("category")?,
        score: row.try_get("score")?,
        player_two_score: row.try_get("player_two_score")?,
        status,
        has_wager: row.try_get("has_wager")?,
        wager_amount: row
            .try_get::<Option<i64>, _>("wager_amount")?
            .map(Tokens::new),
        winner: row.try_get::<Option<Uuid>, _>("winner")?.map(UserId::from_uuid),
        completed_at: row.try_get::<Option<DateTime<Utc>>, _>("completed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn find_user(&mut self, id: UserId) -> Result<Option<UserAccount>> {
        let row = sqlx::query("SELECT id, username, balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_user).transpose()
    }

    async fn save_user(&mut self, user: &UserAccount) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, balance)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                balance = EXCLUDED.balance
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(user.balance.amount())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_session(&mut self, id: SessionId) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, player_one, player_two, mode, category, score, player_two_score,
                   status, has_wager, wager_amount, winner, completed_at, created_at
            FROM game_sessions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_session).transpose()
    }

    async fn insert_session(&mut self, session: &SessionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO game_sessions
                (id, player_one, player_two, mode, category, score, player_two_score,
                 status, has_wager, wager_amount, winner, completed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.player_one.as_uuid())
        .bind(session.player_two.map(UserId::as_uuid))
        .bind(session.mode.as_str())
        .bind(&session.category)
        .bind(session.score)
        .bind(session.player_two_score)
        .bind(session.status.as_str())
        .bind(session.has_wager)
        .bind(session.wager_amount.map(|t| t.amount()))
        .bind(session.winner.map(UserId::as_uuid))
        .bind(session.completed_at)
        .bind(session.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_or_database(e, "session already exists"))?;

        Ok(())
    }

    async fn save_session(&mut self, session: &SessionRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE game_sessions SET
                player_two = $2, mode = $3, category = $4, score = $5,
                player_two_score = $6, status = $7, has_wager = $8,
                wager_amount = $9, winner = $10, completed_at = $11
            WHERE id = $1
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.player_two.map(UserId::as_uuid))
        .bind(session.mode.as_str())
        .bind(&session.category)
        .bind(session.score)
        .bind(session.player_two_score)
        .bind(session.status.as_str())
        .bind(session.has_wager)
        .bind(session.wager_amount.map(|t| t.amount()))
        .bind(session.winner.map(UserId::as_uuid))
        .bind(session.completed_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_session(&mut self, id: SessionId) -> Result<()> {
        sqlx::query("DELETE FROM game_sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn find_wager_by_session(
        &mut self,
        session_id: SessionId,
    ) -> Result<Option<WagerRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, session_id, player_a, player_b, amount, total_pot,
                   status, winner, result_message, resolved_at, created_at
            FROM wagers
            WHERE session_id = $1
            FOR UPDATE
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_wager).transpose()
    }

    async fn insert_wager(&mut self, wager: &WagerRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wagers
                (id, session_id, player_a, player_b, amount, total_pot,
                 status, winner, result_message, resolved_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(wager.id.as_uuid())
        .bind(wager.session_id.as_uuid())
        .bind(wager.player_a.as_uuid())
        .bind(wager.player_b.as_uuid())
        .bind(wager.amount.amount())
        .bind(wager.total_pot.amount())
        .bind(wager.status.as_str())
        .bind(wager.winner.map(UserId::as_uuid))
        .bind(&wager.result_message)
        .bind(wager.resolved_at)
        .bind(wager.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_or_database(e, "wager already exists for session"))?;

        Ok(())
    }

    async fn save_wager(&mut self, wager: &WagerRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE wagers SET
                status = $2, winner = $3, result_message = $4, resolved_at = $5
            WHERE id = $1
            "#,
        )
        .bind(wager.id.as_uuid())
        .bind(wager.status.as_str())
        .bind(wager.winner.map(UserId::as_uuid))
        .bind(&wager.result_message)
        .bind(wager.resolved_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn wagers_for_user(&mut self, user: UserId, limit: usize) -> Result<Vec<WagerRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, player_a, player_b, amount, total_pot,
                   status, winner, result_message, resolved_at, created_at
            FROM wagers
            WHERE player_a = $1 OR player_b = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user.as_uuid())
        .bind(limit as i64)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_wager).collect()
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Maps unique-constraint violations to [`StoreError::Conflict`].
fn conflict_or_database(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(what.to_string());
    }
    StoreError::Database(e)
}
