pub mod health;
pub mod rooms;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms", get(rooms::list_rooms))
        .route("/highscores/{mode}", get(rooms::high_scores))
}
