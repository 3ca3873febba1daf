use crate::{
    db::LEADERBOARD_SIZE,
    models::{GameMode, HighScore},
    websocket::messages::RoomListing,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Rooms waiting for a second player
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomListing>> {
    Json(state.rooms.listings())
}

/// Best scores of a game mode, highest first
pub async fn high_scores(
    Path(mode): Path<GameMode>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HighScore>>, StatusCode> {
    let scores = state
        .recorder
        .top_scores(mode, LEADERBOARD_SIZE)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch highscores for {}: {}", mode.as_str(), e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(scores))
}
