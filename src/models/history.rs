use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::game::{GameFinish, GameMode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerScore {
    pub player_name: String,
    pub score: i32,
}

/// A finished match, as written to the history table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameHistory {
    pub id: Uuid,
    pub mode: GameMode,
    pub started_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub players: Vec<PlayerScore>,
    pub winner: Option<String>,
    pub surrendered: bool,
}

impl GameHistory {
    pub fn from_finish(
        finish: &GameFinish,
        mode: GameMode,
        started_at: DateTime<Utc>,
        surrendered: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            started_at,
            duration_secs: (Utc::now() - started_at).num_seconds(),
            players: finish
                .players
                .iter()
                .map(|p| PlayerScore {
                    player_name: p.name.clone(),
                    score: p.score,
                })
                .collect(),
            winner: finish.winner.clone(),
            surrendered,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HighScore {
    pub player_name: String,
    pub score: i32,
    pub mode: String,
    pub achieved_at: DateTime<Utc>,
}
