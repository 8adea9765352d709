//! Session domain model
//!
//! A session groups jobs that share one backend and an admission policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default session time-to-live (8 hours)
pub const DEFAULT_MAX_TTL_SECS: u64 = 28_800;

/// A session record as held by the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (`session-<uuid>`)
    pub id: String,

    /// Advisory execution mode
    pub mode: SessionMode,

    /// Backend every member job must target, compared by exact string equality
    pub backend_name: String,

    /// Opaque instance identifier supplied by the client
    pub instance: Option<String>,

    /// Maximum lifetime in seconds before the TTL sweep removes the session
    pub max_ttl: u64,

    pub created_at: DateTime<Utc>,

    /// Whether new jobs may be admitted
    pub accepting_jobs: bool,

    /// Cleared once the session is closed or cancelled
    pub active: bool,

    /// Member job ids in admission order
    pub job_ids: Vec<String>,
}

impl Session {
    /// Whole seconds elapsed since creation, measured at `now`
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }

    /// Whether the session outlived its TTL at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let ttl_ms = i64::try_from(self.max_ttl.saturating_mul(1000)).unwrap_or(i64::MAX);
        (now - self.created_at).num_milliseconds() > ttl_ms
    }

    /// Projects the record into its API view at `now`
    pub fn view_at(&self, now: DateTime<Utc>) -> SessionView {
        SessionView {
            id: self.id.clone(),
            mode: self.mode,
            backend: self.backend_name.clone(),
            instance: self.instance.clone(),
            max_ttl: self.max_ttl,
            created_at: self.created_at,
            accepting_jobs: self.accepting_jobs,
            active: self.active,
            elapsed_time: self.elapsed_secs(now),
            jobs: self.job_ids.clone(),
        }
    }
}

/// Execution mode of a session
///
/// The mode is recorded and reported but does not change scheduling: all
/// jobs run through the same single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Sequential intent
    Dedicated,

    /// Parallel intent
    Batch,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Dedicated => write!(f, "dedicated"),
            SessionMode::Batch => write!(f, "batch"),
        }
    }
}

/// Session as presented by the API, with derived elapsed time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub mode: SessionMode,
    pub backend: String,
    pub instance: Option<String>,
    pub max_ttl: u64,
    pub created_at: DateTime<Utc>,
    pub accepting_jobs: bool,
    pub active: bool,
    /// Whole seconds since creation
    pub elapsed_time: i64,
    pub jobs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(max_ttl: u64) -> Session {
        Session {
            id: "session-1".to_string(),
            mode: SessionMode::Batch,
            backend_name: "fake_manila@aer".to_string(),
            instance: None,
            max_ttl,
            created_at: Utc::now(),
            accepting_jobs: true,
            active: true,
            job_ids: vec!["job-a".to_string(), "job-b".to_string()],
        }
    }

    #[test]
    fn test_view_reports_elapsed_seconds() {
        let s = session(60);
        let view = s.view_at(s.created_at + Duration::milliseconds(2_500));
        assert_eq!(view.elapsed_time, 2);
        assert_eq!(view.backend, "fake_manila@aer");
        assert_eq!(view.jobs, vec!["job-a", "job-b"]);
    }

    #[test]
    fn test_expiry_is_strictly_after_ttl() {
        let s = session(10);
        assert!(!s.is_expired(s.created_at + Duration::seconds(10)));
        assert!(s.is_expired(s.created_at + Duration::milliseconds(10_001)));
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionMode::Dedicated).unwrap(),
            "\"dedicated\""
        );
        let mode: SessionMode = serde_json::from_str("\"batch\"").unwrap();
        assert_eq!(mode, SessionMode::Batch);
    }
}
