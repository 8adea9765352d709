//! Configuration module
//!
//! Handles CLI configuration, currently just the server URL.

use qrun_client::QrunClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the qrun server
    pub server_url: String,
}

impl Config {
    /// Client for the configured server
    pub fn client(&self) -> QrunClient {
        QrunClient::new(&self.server_url)
    }
}
