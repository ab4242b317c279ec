//! HTTP API module - REST endpoints and WebSocket

mod sessions;
mod websocket;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::combat::ValidationError;
use crate::db::Database;
use crate::sync::{CommandError, SyncError, SyncGateway};
pub use websocket::{ClientMessage, ServerMessage};

/// Header carrying the caller's user id, set by the identity layer in front of us
pub const USER_HEADER: &str = "x-user-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub gateway: Arc<SyncGateway>,
}

/// Build the API router
pub fn router(db: Arc<Database>, gateway: Arc<SyncGateway>) -> Router {
    let state = AppState { db, gateway };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/sessions/{id}/ws", get(websocket::ws_handler))
        .merge(sessions::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API failure mapped onto an HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing x-user-id header")]
    MissingUser,

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        ApiError::Command(CommandError::Sync(e))
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Command(CommandError::Validation(e))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUser => StatusCode::UNAUTHORIZED,
            ApiError::Command(CommandError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Command(CommandError::Sync(e)) => match e {
                SyncError::NotFound(_) => StatusCode::NOT_FOUND,
                SyncError::AccessDenied { .. } => StatusCode::FORBIDDEN,
                SyncError::InvalidOwner => StatusCode::BAD_REQUEST,
                SyncError::Database(_) | SyncError::Encoding(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("request failed: {}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Caller identity from the request headers
pub(crate) fn caller(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingUser)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "d2d",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}
