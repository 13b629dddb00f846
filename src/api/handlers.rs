//! Request handlers
//!
//! Handlers only translate between JSON and ledger calls; every rule lives
//! in the ledger.

use crate::api::error::{invalid_body, invalid_query, ApiError};
use crate::error::PodiumError;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::service::AppState;
use crate::types::{CreatedResponse, GameSubmission, Season, SeasonConfig, SeasonPlayer};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeasonRequest {
    pub name: String,
    #[serde(default)]
    pub config: Option<SeasonConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSeasonRequest {
    /// Defaults to the time of the request
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPlayerRequest {
    pub season_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersQuery {
    pub season_id: Option<String>,
}

fn record(state: &AppState, route: &str, status: StatusCode) {
    state.metrics().record_request(route, status.as_u16());
}

/// Attach the request to metrics and turn failures into responses
fn respond<T: IntoResponse>(
    state: &AppState,
    route: &str,
    result: ApiResult<(StatusCode, T)>,
) -> Response {
    match result {
        Ok((status, body)) => {
            record(state, route, status);
            (status, body).into_response()
        }
        Err(e) => {
            let (status, _) = e.parts();
            record(state, route, status);
            e.into_response()
        }
    }
}

pub async fn submit_game(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GameSubmission>, JsonRejection>,
) -> Response {
    let result = submit_game_inner(&state, body).await;
    respond(&state, "/games", result)
}

async fn submit_game_inner(
    state: &AppState,
    body: Result<Json<GameSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(submission) = body.map_err(invalid_body)?;
    let game = state.ledger().submit_game(submission).await?;

    Ok((StatusCode::OK, Json(CreatedResponse { id: game.id })))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Response {
    let result = state
        .ledger()
        .get_game(&game_id)
        .await
        .map(|game| (StatusCode::OK, Json(game)))
        .map_err(ApiError::from);

    respond(&state, "/games/{game_id}", result)
}

pub async fn create_season(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateSeasonRequest>, JsonRejection>,
) -> Response {
    let result = create_season_inner(&state, body).await;
    respond(&state, "/seasons", result)
}

async fn create_season_inner(
    state: &AppState,
    body: Result<Json<CreateSeasonRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(request) = body.map_err(invalid_body)?;
    let season = state
        .ledger()
        .create_season(&request.name, request.config)
        .await?;

    Ok((StatusCode::OK, Json(CreatedResponse { id: season.id })))
}

pub async fn list_seasons(State(state): State<Arc<AppState>>) -> Response {
    let result = state
        .ledger()
        .list_seasons()
        .await
        .map(|seasons| (StatusCode::OK, Json(seasons)))
        .map_err(ApiError::from);

    respond(&state, "/seasons", result)
}

pub async fn get_season(
    State(state): State<Arc<AppState>>,
    Path(season_id): Path<String>,
) -> Response {
    let result = state
        .ledger()
        .get_season(&season_id)
        .await
        .map(|season| (StatusCode::OK, Json(season)))
        .map_err(ApiError::from);

    respond(&state, "/seasons/{season_id}", result)
}

pub async fn end_season(
    State(state): State<Arc<AppState>>,
    Path(season_id): Path<String>,
    body: Result<Json<EndSeasonRequest>, JsonRejection>,
) -> Response {
    let result = end_season_inner(&state, &season_id, body).await;
    respond(&state, "/seasons/{season_id}/end", result)
}

async fn end_season_inner(
    state: &AppState,
    season_id: &str,
    body: Result<Json<EndSeasonRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Season>)> {
    // The body is optional
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => EndSeasonRequest::default(),
        Err(rejection) => return Err(invalid_body(rejection)),
    };

    let at = request.end_date.unwrap_or_else(Utc::now);
    let season = state.ledger().end_season(season_id, at).await?;

    Ok((StatusCode::OK, Json(season)))
}

pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Path(season_id): Path<String>,
) -> Response {
    let result = state
        .ledger()
        .list_games(&season_id)
        .await
        .map(|games| (StatusCode::OK, Json(games)))
        .map_err(ApiError::from);

    respond(&state, "/seasons/{season_id}/games", result)
}

pub async fn list_players(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PlayersQuery>, QueryRejection>,
) -> Response {
    let result = list_players_inner(&state, query).await;
    respond(&state, "/players", result)
}

async fn list_players_inner(
    state: &AppState,
    query: Result<Query<PlayersQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<Vec<SeasonPlayer>>)> {
    let Query(query) = query.map_err(invalid_query)?;
    let season_id = query
        .season_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| PodiumError::invalid_input("Query parameter seasonId is required"))?;

    let players = state.ledger().list_players(&season_id).await?;
    Ok((StatusCode::OK, Json(players)))
}

pub async fn register_player(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterPlayerRequest>, JsonRejection>,
) -> Response {
    let result = register_player_inner(&state, body).await;
    respond(&state, "/players", result)
}

async fn register_player_inner(
    state: &AppState,
    body: Result<Json<RegisterPlayerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(request) = body.map_err(invalid_body)?;
    let player = state
        .ledger()
        .register_player(&request.season_id, &request.name)
        .await?;

    Ok((StatusCode::OK, Json(CreatedResponse { id: player.id })))
}

/// Storage probe and activity summary
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    debug!("Health check requested");

    match HealthCheck::check(&state).await {
        Ok(health) => {
            let status = if health.status == HealthStatus::Healthy {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(health)).into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Prometheus metrics endpoint handler
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics().encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
