use sqlx::{types::Json, PgPool, Result};

use crate::models::{GameHistory, GameMode, HighScore, PlayerScore};

// Highscore queries

/// Record a final score, keeping each player's best per mode
pub async fn update_high_score(pool: &PgPool, score: &PlayerScore, mode: GameMode) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO high_scores (player_name, score, mode, achieved_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (player_name, mode)
        DO UPDATE SET
            score = EXCLUDED.score,
            achieved_at = EXCLUDED.achieved_at
        WHERE high_scores.score < EXCLUDED.score
        "#,
    )
    .bind(&score.player_name)
    .bind(score.score)
    .bind(mode.as_str())
    .execute(pool)
    .await?;

    tracing::debug!(
        "Highscore submitted for {} ({} points, {})",
        score.player_name,
        score.score,
        mode.as_str()
    );

    Ok(())
}

pub async fn get_top_scores(pool: &PgPool, mode: GameMode, limit: i64) -> Result<Vec<HighScore>> {
    sqlx::query_as::<_, HighScore>(
        r#"
        SELECT player_name, score, mode, achieved_at
        FROM high_scores
        WHERE mode = $1
        ORDER BY score DESC, achieved_at ASC
        LIMIT $2
        "#,
    )
    .bind(mode.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await
}

// Game history queries

pub async fn add_game_history(pool: &PgPool, history: &GameHistory) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO game_history (id, mode, started_at, duration_secs, players, winner, surrendered)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(history.id)
    .bind(history.mode.as_str())
    .bind(history.started_at)
    .bind(history.duration_secs)
    .bind(Json(&history.players))
    .bind(history.winner.as_deref())
    .bind(history.surrendered)
    .execute(pool)
    .await?;

    Ok(())
}
