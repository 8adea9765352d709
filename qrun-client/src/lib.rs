//! qrun HTTP Client
//!
//! A simple, type-safe HTTP client for the qrun server REST API.
//!
//! # Example
//!
//! ```no_run
//! use qrun_client::QrunClient;
//! use qrun_core::dto::job::CreateJob;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> qrun_client::Result<()> {
//!     let client = QrunClient::new("http://localhost:8000");
//!
//!     let created = client.create_job(&CreateJob {
//!         program_id: "sampler".to_string(),
//!         backend: "fake_manila@aer".to_string(),
//!         params: serde_json::json!({"pubs": []}),
//!         options: None,
//!         session_id: None,
//!     }).await?;
//!
//!     let job = client
//!         .wait_for_job(&created.id, Duration::from_millis(500), Duration::from_secs(60))
//!         .await?;
//!     println!("Job {} finished: {}", job.id, job.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod backends;
mod jobs;
mod sessions;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the qrun server API
///
/// Methods are grouped by resource:
/// - Server info and backend discovery
/// - Job submission, status, results and cancellation
/// - Session lifecycle
#[derive(Debug, Clone)]
pub struct QrunClient {
    /// Base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl QrunClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use qrun_client::QrunClient;
    ///
    /// let client = QrunClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., 204 from DELETE)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = QrunClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = QrunClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/v1/jobs"), "http://localhost:8000/v1/jobs");
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = QrunClient::with_client("http://qrun.internal:8000", Client::new());
        assert_eq!(client.base_url(), "http://qrun.internal:8000");
    }
}
