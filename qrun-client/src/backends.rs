//! Server info and backend endpoints

use crate::QrunClient;
use crate::error::Result;
use qrun_core::domain::backend::BackendConfiguration;
use qrun_core::dto::backend::{BackendStatus, BackendsResponse, ServerInfo};

impl QrunClient {
    /// Server version and registered executors
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let response = self.client.get(self.url("/")).send().await?;

        self.handle_response(response).await
    }

    /// Every virtual backend the server exposes
    pub async fn list_backends(&self) -> Result<Vec<BackendConfiguration>> {
        let response = self.client.get(self.url("/v1/backends")).send().await?;

        let backends: BackendsResponse = self.handle_response(response).await?;
        Ok(backends.devices)
    }

    pub async fn backend_configuration(&self, name: &str) -> Result<BackendConfiguration> {
        let url = self.url(&format!("/v1/backends/{}/configuration", name));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Operational status, including the executor's pending job count
    pub async fn backend_status(&self, name: &str) -> Result<BackendStatus> {
        let url = self.url(&format!("/v1/backends/{}/status", name));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
