//! HTTP API
//!
//! JSON routes over the ledger plus the health and Prometheus endpoints.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::service::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/games", post(handlers::submit_game))
        .route("/games/{game_id}", get(handlers::get_game))
        .route(
            "/seasons",
            get(handlers::list_seasons).post(handlers::create_season),
        )
        .route("/seasons/{season_id}", get(handlers::get_season))
        .route("/seasons/{season_id}/end", post(handlers::end_season))
        .route("/seasons/{season_id}/games", get(handlers::list_games))
        .route(
            "/players",
            get(handlers::list_players).post(handlers::register_player),
        )
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}
