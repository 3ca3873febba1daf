mod config;
mod db;
mod dictionary;
mod game;
mod models;
mod room;
mod routes;
mod solver;
mod utils;
mod websocket;

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use config::{Config, DatabaseConfig};
use db::{GameRecorder, LogRecorder, PgRecorder};
use dictionary::Dictionary;
use room::RoomManager;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub rooms: Arc<RoomManager>,
    pub recorder: Arc<dyn GameRecorder>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrabble_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Starting Scrabble server ({}s per round, {:?} reconnect grace)",
        config.game.time_per_round.as_secs(),
        config.game.reconnect_grace
    );

    let dictionary = load_dictionary(&config.game.dictionary_path).await;
    let recorder = open_recorder(config.database.as_ref()).await?;

    let rooms = Arc::new(RoomManager::new(
        Arc::new(config.game.clone()),
        Arc::new(dictionary),
        recorder.clone(),
    ));
    let app = build_router(Arc::new(AppState { rooms, recorder }));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {} (WebSocket at ws://{}/ws)", addr, addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// An unreadable word list leaves the server up with an empty dictionary
async fn load_dictionary(path: &str) -> Dictionary {
    match Dictionary::load(path).await {
        Ok(dict) => {
            tracing::info!("Dictionary loaded: {} words", dict.len());
            dict
        }
        Err(e) => {
            tracing::warn!("Failed to load dictionary from {}: {}", path, e);
            tracing::warn!("Every word will be rejected until a word list is provided");
            Dictionary::empty()
        }
    }
}

/// Postgres when a database is configured, otherwise finished games are only logged
async fn open_recorder(database: Option<&DatabaseConfig>) -> Result<Arc<dyn GameRecorder>> {
    let Some(database) = database else {
        tracing::warn!("DATABASE_URL not set, scores will not be saved");
        return Ok(Arc::new(LogRecorder));
    };

    let pool = db::create_pool(&database.url, database.max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Connected to database, migrations applied");

    Ok(Arc::new(PgRecorder::new(pool)))
}

fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(websocket::handle_websocket))
        .merge(routes::create_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
