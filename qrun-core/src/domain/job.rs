//! Job domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Execution options attached to a job (e.g. `default_shots`, `default_precision`)
pub type JobOptions = HashMap<String, serde_json::Value>;

/// Job execution record
///
/// Owned by the server's job manager; callers only ever receive copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub program_id: String,
    pub backend_name: String,
    pub params: serde_json::Value,
    pub options: JobOptions,
    pub session_id: Option<String>,
    pub status: JobStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

impl Job {
    /// Creates a freshly admitted job in `QUEUED` state
    pub fn queued(
        id: String,
        program_id: String,
        backend_name: String,
        params: serde_json::Value,
        options: JobOptions,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id,
            program_id,
            backend_name,
            params,
            options,
            session_id,
            status: JobStatus::Queued,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error_message: None,
        }
    }
}

/// Job execution status
///
/// Legal transitions: `Queued -> Running -> {Completed | Failed}` and
/// `Queued -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether the job has reached a final state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether the job still occupies the queue (waiting or executing)
    pub fn is_pending(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Primitive program a job runs
///
/// Jobs store the raw program id string; it is only interpreted when the
/// worker dispatches the job, so unknown kinds are admitted and fail later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    Sampler,
    Estimator,
}

impl FromStr for ProgramKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sampler" => Ok(ProgramKind::Sampler),
            "estimator" => Ok(ProgramKind::Estimator),
            other => Err(format!("Unknown program kind: {}", other)),
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramKind::Sampler => write!(f, "sampler"),
            ProgramKind::Estimator => write!(f, "estimator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&JobStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");

        let status: JobStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(status, JobStatus::Running);
    }

    #[test]
    fn test_terminal_and_pending_partition() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_ne!(status.is_terminal(), status.is_pending());
        }
    }

    #[test]
    fn test_program_kind_parse() {
        assert_eq!("sampler".parse::<ProgramKind>(), Ok(ProgramKind::Sampler));
        assert_eq!(
            "estimator".parse::<ProgramKind>(),
            Ok(ProgramKind::Estimator)
        );

        let err = "bogus".parse::<ProgramKind>().unwrap_err();
        assert!(err.contains("bogus"));
    }

    #[test]
    fn test_queued_job_has_no_progress_timestamps() {
        let job = Job::queued(
            "job-1".to_string(),
            "sampler".to_string(),
            "fake_manila@aer".to_string(),
            serde_json::json!({"pubs": []}),
            JobOptions::new(),
            None,
        );
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.started_at.is_none());
        assert!(job.completed_at.is_none());
        assert!(job.result.is_none());
        assert!(job.error_message.is_none());
    }
}
