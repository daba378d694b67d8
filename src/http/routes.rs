//! Admin HTTP route definitions

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::game::{Coin, PlayerMap};
use crate::util::time::uptime_secs;

/// Build the admin router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/players", get(players_handler))
        .route("/coin", get(coin_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connections: usize,
    players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connections: state.registry.len().await,
        players: state.world.player_count(),
    })
}

// ============================================================================
// World inspection
// ============================================================================

async fn players_handler(State(state): State<AppState>) -> Json<PlayerMap> {
    Json(state.world.players_snapshot())
}

async fn coin_handler(State(state): State<AppState>) -> Json<Coin> {
    Json(state.world.coin())
}
