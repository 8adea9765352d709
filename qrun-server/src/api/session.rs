//! Session API Handlers
//!
//! HTTP endpoints for the session lifecycle.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use qrun_core::domain::session::SessionView;
use qrun_core::dto::session::{CreateSession, UpdateSession};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

fn session_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Session {} not found", id))
}

/// POST /v1/sessions
/// Open a session bound to one backend
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSession>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    if state.metadata.parse_backend_name(&req.backend).is_none() {
        return Err(ApiError::NotFound(format!(
            "Backend {} not found or invalid",
            req.backend
        )));
    }

    let id = state
        .sessions
        .create_session(req.mode, req.backend, req.instance, req.max_ttl);

    let view = state
        .sessions
        .get_session_view(&id)
        .ok_or_else(|| session_not_found(&id))?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /v1/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionView>> {
    tracing::debug!("Listing all sessions");
    Json(state.sessions.list_sessions())
}

/// GET /v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    tracing::debug!("Getting session: {}", id);

    state
        .sessions
        .get_session_view(&id)
        .map(Json)
        .ok_or_else(|| session_not_found(&id))
}

/// PATCH /v1/sessions/{id}
/// Toggle whether the session admits new jobs
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSession>,
) -> ApiResult<Json<SessionView>> {
    if !state.sessions.update_session(&id, req.accepting_jobs) {
        return Err(session_not_found(&id));
    }

    state
        .sessions
        .get_session_view(&id)
        .map(Json)
        .ok_or_else(|| session_not_found(&id))
}

/// DELETE /v1/sessions/{id}/close
/// Stop intake; queued and running jobs proceed
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.sessions.close_session(&id) {
        return Err(session_not_found(&id));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/sessions/{id}/cancel
/// Stop intake and cancel the session's queued jobs
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.sessions.cancel_session(&id) {
        return Err(session_not_found(&id));
    }

    let cancelled = state.jobs.cancel_session_jobs(&id);
    tracing::info!("Session {} cancelled with {} queued job(s)", id, cancelled);

    Ok(StatusCode::NO_CONTENT)
}
