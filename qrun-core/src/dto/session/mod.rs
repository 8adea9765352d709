//! Session DTOs for the REST API

use serde::{Deserialize, Serialize};

use crate::domain::session::{DEFAULT_MAX_TTL_SECS, SessionMode};

/// Request to open a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub mode: SessionMode,
    /// Backend in `metadata@executor` form
    pub backend: String,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default = "default_max_ttl")]
    pub max_ttl: u64,
}

fn default_max_ttl() -> u64 {
    DEFAULT_MAX_TTL_SECS
}

/// Request to change whether a session admits new jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSession {
    pub accepting_jobs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_defaults() {
        let req: CreateSession =
            serde_json::from_str(r#"{"mode": "dedicated", "backend": "fake_manila@aer"}"#).unwrap();
        assert_eq!(req.mode, SessionMode::Dedicated);
        assert_eq!(req.max_ttl, DEFAULT_MAX_TTL_SECS);
        assert!(req.instance.is_none());
    }
}
