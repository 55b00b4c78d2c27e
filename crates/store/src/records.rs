//! Stored records and their status enums.

use chrono::{DateTime, Utc};
use common::{SessionId, Tokens, UserId, WagerId};
use serde::{Deserialize, Serialize};

/// A user account, reduced to the fields the wager core touches.
///
/// The account store owns the full profile; the ledger only ever mutates
/// `balance`, and only inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub balance: Tokens,
}

impl UserAccount {
    /// Creates an account with the given username and starting balance.
    pub fn new(username: impl Into<String>, balance: Tokens) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            balance,
        }
    }
}

/// The state of a wager in its lifecycle.
///
/// State transitions:
/// ```text
/// Staked ──┬──► Won
///          └──► Refunded
/// ```
///
/// `Staked` is the sole initial state; `Won` and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WagerStatus {
    /// Both stakes are held; the wager awaits resolution.
    #[default]
    Staked,

    /// The pot was released to the winner (terminal state).
    Won,

    /// Both stakes were returned after a draw (terminal state).
    Refunded,
}

impl WagerStatus {
    /// Returns true if the wager can still be resolved.
    pub fn can_resolve(&self) -> bool {
        matches!(self, WagerStatus::Staked)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WagerStatus::Won | WagerStatus::Refunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerStatus::Staked => "Staked",
            WagerStatus::Won => "Won",
            WagerStatus::Refunded => "Refunded",
        }
    }

    /// Parses a status from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Staked" => Some(WagerStatus::Staked),
            "Won" => Some(WagerStatus::Won),
            "Refunded" => Some(WagerStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A two-player token wager tied to a single game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerRecord {
    pub id: WagerId,
    /// The session this wager settles with. At most one wager per session.
    pub session_id: SessionId,
    pub player_a: UserId,
    pub player_b: UserId,
    /// Per-player stake. Positive, identical for both players.
    pub amount: Tokens,
    /// Sum of both stakes, always `2 * amount`.
    pub total_pot: Tokens,
    pub status: WagerStatus,
    /// Set only when `status` is [`WagerStatus::Won`].
    pub winner: Option<UserId>,
    pub result_message: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WagerRecord {
    /// Creates a freshly staked wager.
    pub fn new(session_id: SessionId, player_a: UserId, player_b: UserId, amount: Tokens) -> Self {
        Self {
            id: WagerId::new(),
            session_id,
            player_a,
            player_b,
            amount,
            total_pot: amount.double(),
            status: WagerStatus::Staked,
            winner: None,
            result_message: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    /// Returns true if `user` is one of the wagering players.
    pub fn is_participant(&self, user: UserId) -> bool {
        self.player_a == user || self.player_b == user
    }

    /// Marks the wager won. The caller must have verified the status guard.
    pub fn mark_won(&mut self, winner: UserId, message: impl Into<String>) {
        self.status = WagerStatus::Won;
        self.winner = Some(winner);
        self.result_message = Some(message.into());
        self.resolved_at = Some(Utc::now());
    }

    /// Marks the wager refunded after a draw.
    pub fn mark_refunded(&mut self, message: impl Into<String>) {
        self.status = WagerStatus::Refunded;
        self.winner = None;
        self.result_message = Some(message.into());
        self.resolved_at = Some(Utc::now());
    }
}

/// How a session is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    SinglePlayer,
    Multiplayer,
    Wagered,
}

impl GameMode {
    /// Returns true if the mode requires a second player.
    pub fn requires_opponent(&self) -> bool {
        matches!(self, GameMode::Multiplayer | GameMode::Wagered)
    }

    /// Returns the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::SinglePlayer => "SinglePlayer",
            GameMode::Multiplayer => "Multiplayer",
            GameMode::Wagered => "Wagered",
        }
    }

    /// Parses a mode from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SinglePlayer" => Some(GameMode::SinglePlayer),
            "Multiplayer" => Some(GameMode::Multiplayer),
            "Wagered" => Some(GameMode::Wagered),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of a game session.
///
/// A session transitions `InProgress` → `Completed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionStatus {
    #[default]
    InProgress,
    Completed,
}

impl SessionStatus {
    /// Returns true if the session can still be completed.
    pub fn can_complete(&self) -> bool {
        matches!(self, SessionStatus::InProgress)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "InProgress",
            SessionStatus::Completed => "Completed",
        }
    }

    /// Parses a status from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "InProgress" => Some(SessionStatus::InProgress),
            "Completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scored game session, possibly wagered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub player_one: UserId,
    /// Absent for single-player sessions.
    pub player_two: Option<UserId>,
    pub mode: GameMode,
    pub category: String,
    pub score: i32,
    pub player_two_score: i32,
    pub status: SessionStatus,
    pub has_wager: bool,
    pub wager_amount: Option<Tokens>,
    /// Set on completion of a multiplayer game; `None` on a draw.
    pub winner: Option<UserId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates an in-progress session.
    pub fn new(
        player_one: UserId,
        player_two: Option<UserId>,
        mode: GameMode,
        category: impl Into<String>,
        wager_amount: Option<Tokens>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            player_one,
            player_two,
            mode,
            category: category.into(),
            score: 0,
            player_two_score: 0,
            status: SessionStatus::InProgress,
            has_wager: wager_amount.is_some(),
            wager_amount,
            winner: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Records final scores and marks the session completed.
    pub fn complete(&mut self, score: i32, player_two_score: i32, winner: Option<UserId>) {
        self.score = score;
        self.player_two_score = player_two_score;
        self.winner = winner;
        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}
