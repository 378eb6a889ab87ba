//! HTTP handlers for album search and the recommendation service.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::presenter::PresentationSlot;
use crate::recommend::model::ModelInput;
use crate::recommend::Recommender;
use crate::search::SearchOrchestrator;
use crate::spotify::Album;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub search: SearchOrchestrator,
    pub recommender: Recommender,
    pub slot: Arc<PresentationSlot>,
}

/// Query parameters for album search.
#[derive(Debug, Deserialize)]
pub struct AlbumSearchQuery {
    /// Free-text artist name.
    #[serde(default)]
    pub q: String,
}

/// API response for album search.
#[derive(Debug, Serialize)]
pub struct AlbumSearchResponse {
    pub query: String,
    pub albums: Vec<Album>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub artist_id: String,
}

/// Body of `POST /train`.
#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub albums: Option<Vec<ModelInput>>,
    #[serde(default)]
    pub labels: Option<Vec<f64>>,
}

/// GET /health - Health check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/albums - Search an artist and return their scored albums.
pub async fn search_albums(
    State(state): State<AppState>,
    params: Result<Query<AlbumSearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let ticket = state.slot.begin();
    let outcome = state.search.search(&params.q).await;
    state.slot.publish(ticket, &params.q, &outcome);

    let albums = outcome.map_err(|e| {
        tracing::warn!(query = %params.q, error = %e, "album search failed");
        AppError::from(e)
    })?;

    Ok((StatusCode::OK, Json(AlbumSearchResponse { query: params.q, albums })))
}

/// GET /api/v1/albums/latest - The most recent search result on display.
pub async fn latest_albums(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.slot.current())
}

/// GET /recommend - Rank an artist's albums by model score.
pub async fn recommend(
    State(state): State<AppState>,
    params: Result<Query<RecommendQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let recommendation = state
        .recommender
        .recommend(&params.artist_id)
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    Ok(Json(recommendation))
}

/// POST /train - Fit the album model on labelled examples.
pub async fn train(
    State(state): State<AppState>,
    payload: Result<Json<TrainRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let (albums, labels) = match (payload.albums, payload.labels) {
        (Some(albums), Some(labels))
            if !albums.is_empty() && !labels.is_empty() && albums.len() == labels.len() =>
        {
            (albums, labels)
        }
        _ => {
            return Err(AppError::BadRequest(
                "albums and labels required and must match length".into(),
            ))
        }
    };

    state
        .recommender
        .train(&albums, &labels)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(serde_json::json!({ "status": "trained" })))
}

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/albums", get(search_albums))
        .route("/api/v1/albums/latest", get(latest_albums))
        .route("/recommend", get(recommend))
        .route("/train", post(train))
}
