//! Backend API Handlers
//!
//! Server information and virtual backend discovery.

use axum::{
    Json,
    extract::{Path, State},
};
use qrun_core::domain::backend::BackendConfiguration;
use qrun_core::dto::backend::{BackendStatus, BackendsResponse, ServerInfo};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

fn backend_not_found(name: &str) -> ApiError {
    ApiError::NotFound(format!("Backend {} not found", name))
}

/// GET /
pub async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        message: "Quantum runtime server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        executors: state.metadata.executors().to_vec(),
    })
}

/// GET /v1/backends
pub async fn list_backends(State(state): State<AppState>) -> Json<BackendsResponse> {
    Json(BackendsResponse {
        devices: state.metadata.list_backends(),
    })
}

/// GET /v1/backends/{name}/configuration
pub async fn get_backend_configuration(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<BackendConfiguration>> {
    state
        .metadata
        .configuration(&name)
        .map(Json)
        .ok_or_else(|| backend_not_found(&name))
}

/// GET /v1/backends/{name}/properties
/// The catalogue carries no calibration data, so this is always 404
pub async fn get_backend_properties(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if state.metadata.parse_backend_name(&name).is_none() {
        return Err(backend_not_found(&name));
    }

    Err(ApiError::NotFound(format!(
        "Properties not available for backend {}",
        name
    )))
}

/// GET /v1/backends/{name}/status
pub async fn get_backend_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<BackendStatus>> {
    let (_, executor) = state
        .metadata
        .parse_backend_name(&name)
        .ok_or_else(|| backend_not_found(&name))?;

    Ok(Json(BackendStatus {
        state: true,
        status: "active".to_string(),
        message: String::new(),
        length_queue: state.jobs.get_queue_length(Some(&executor)),
        backend_version: "1.0.0".to_string(),
    }))
}
