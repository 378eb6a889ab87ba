use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the catalog stage of a search.
///
/// Score enrichment problems never show up here: they degrade to unscored
/// albums inside the enricher.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("no access token available")]
    Unauthenticated,
    #[error("no artist matches {0:?}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    NotFound(String),
    Spotify(String),
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        let msg = err.to_string();
        match err {
            SearchError::Unauthenticated => AppError::Unauthorized(msg),
            SearchError::NotFound(_) => AppError::NotFound(msg),
            SearchError::Upstream(_) => AppError::Spotify(msg),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Spotify(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        (
            status,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
