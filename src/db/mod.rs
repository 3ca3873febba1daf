use anyhow::Result;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::models::{GameHistory, GameMode, HighScore, PlayerScore};

pub mod queries;

/// Highscores returned by the leaderboard
pub const LEADERBOARD_SIZE: i64 = 5;

pub async fn create_pool(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Where finished games are written.
///
/// Rooms call this from spawned tasks and only log failures, so an
/// implementation may be slow or unavailable without affecting play.
#[async_trait]
pub trait GameRecorder: Send + Sync {
    async fn update_high_score(&self, score: &PlayerScore, mode: GameMode) -> Result<()>;

    async fn add_game_history(&self, history: &GameHistory) -> Result<()>;

    async fn top_scores(&self, mode: GameMode, limit: i64) -> Result<Vec<HighScore>>;
}

/// Postgres backed recorder
pub struct PgRecorder {
    pool: PgPool,
}

impl PgRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRecorder for PgRecorder {
    async fn update_high_score(&self, score: &PlayerScore, mode: GameMode) -> Result<()> {
        queries::update_high_score(&self.pool, score, mode).await?;
        Ok(())
    }

    async fn add_game_history(&self, history: &GameHistory) -> Result<()> {
        queries::add_game_history(&self.pool, history).await?;
        Ok(())
    }

    async fn top_scores(&self, mode: GameMode, limit: i64) -> Result<Vec<HighScore>> {
        Ok(queries::get_top_scores(&self.pool, mode, limit).await?)
    }
}

/// Used when no database is configured: records are only logged
pub struct LogRecorder;

#[async_trait]
impl GameRecorder for LogRecorder {
    async fn update_high_score(&self, score: &PlayerScore, mode: GameMode) -> Result<()> {
        tracing::info!(
            "Highscore not stored (no database): {} scored {} in {}",
            score.player_name,
            score.score,
            mode.as_str()
        );
        Ok(())
    }

    async fn add_game_history(&self, history: &GameHistory) -> Result<()> {
        tracing::info!(
            "Game history not stored (no database): game {} won by {:?}",
            history.id,
            history.winner
        );
        Ok(())
    }

    async fn top_scores(&self, _mode: GameMode, _limit: i64) -> Result<Vec<HighScore>> {
        Ok(Vec::new())
    }
}
