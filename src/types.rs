//! Common types used throughout the season ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a player within a season (`player#...`)
pub type PlayerId = String;

/// Identifier of a season (`season#...`)
pub type SeasonId = String;

/// Identifier of a recorded game (`game#...`)
pub type GameId = String;

/// Stored rating value. Ratings are whole numbers so repeated games never
/// accumulate fractional drift.
pub type Rating = i64;

/// Finishing position in a game, 1 = first place. Ties share a value.
pub type Placement = u32;

/// Rating parameters fixed when a season is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonConfig {
    /// Rating assigned to first-time players
    pub starting_elo: Rating,
    /// Maximum rating swing per game
    pub k: f64,
    /// Logistic divisor for expected scores
    pub d: f64,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            starting_elo: 1200,
            k: 32.0,
            d: 400.0,
        }
    }
}

/// A bounded competitive period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    /// `None` while the season is ongoing
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub config: SeasonConfig,
}

impl Season {
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }
}

/// A player's standing within one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonPlayer {
    pub id: PlayerId,
    /// Season this player belongs to
    pub season: SeasonId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub elo: Rating,
    pub games_played: u64,
}

/// Participant reference stored inside a game result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResultItemPlayer {
    pub id: PlayerId,
    pub name: String,
}

/// One participant's outcome within a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultItem {
    pub player: GameResultItemPlayer,
    pub placement: Placement,
    pub elo_before_game: Rating,
    pub elo_after_game: Rating,
}

/// A recorded game. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub created_at: DateTime<Utc>,
    pub player_ids: Vec<PlayerId>,
    pub results: Vec<GameResultItem>,
    /// Snapshot of the season at the time the game was played
    pub season: Season,
}

/// One participant as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResult {
    /// `None` for a first-time player
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub player_name: String,
    pub placement: Placement,
}

impl SubmittedResult {
    pub fn known(player_id: impl Into<PlayerId>, placement: Placement) -> Self {
        Self {
            player_id: Some(player_id.into()),
            player_name: String::new(),
            placement,
        }
    }

    pub fn unknown(player_name: impl Into<String>, placement: Placement) -> Self {
        Self {
            player_id: None,
            player_name: player_name.into(),
            placement,
        }
    }

    pub fn is_new_player(&self) -> bool {
        self.player_id.is_none()
    }
}

/// Game result submission received from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSubmission {
    pub season_id: SeasonId,
    pub results: Vec<SubmittedResult>,
}

/// Response body for successful create operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}
