//! Backend and server information DTOs

use serde::{Deserialize, Serialize};

use crate::domain::backend::BackendConfiguration;

/// Response for `GET /v1/backends`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsResponse {
    pub devices: Vec<BackendConfiguration>,
}

/// Operational status of a virtual backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    pub state: bool,
    pub status: String,
    pub message: String,
    /// Jobs queued or running on the backend's executor
    pub length_queue: usize,
    pub backend_version: String,
}

/// Response for `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub message: String,
    pub version: String,
    pub executors: Vec<String>,
}
