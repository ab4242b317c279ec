//! Combat session endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::{caller, ApiError, AppState};
use crate::combat::CombatSession;
use crate::commands::Command;
use crate::sync::SessionSummary;

/// Build session router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/commands", post(execute_command))
}

/// Create session response
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

/// Start a new session owned by the caller
async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = caller(&headers)?;
    let id = state.gateway.create_session(&user).await?;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { id })))
}

/// Sessions the caller runs or plays in
async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let user = caller(&headers)?;
    Ok(Json(state.gateway.find_sessions(&user).await?))
}

/// Fetch the full session document
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CombatSession>, ApiError> {
    let user = caller(&headers)?;
    let controller = state.gateway.load_for(&id, &user).await?;
    Ok(Json(controller.into_session()))
}

/// Delete a session (dungeon master only)
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = caller(&headers)?;
    state.gateway.delete_session(&id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run one command and return the resulting document
async fn execute_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(command): Json<Command>,
) -> Result<Json<CombatSession>, ApiError> {
    let user = caller(&headers)?;
    let session = state.gateway.execute(&id, &user, command, None).await?;
    Ok(Json(session))
}
