//! Job DTOs for the REST API

use serde::{Deserialize, Serialize};

use crate::domain::job::{Job, JobOptions, JobStatus};

/// Request to submit a new job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Program to run (`sampler` or `estimator`)
    pub program_id: String,
    /// Backend in `metadata@executor` form
    pub backend: String,
    pub params: serde_json::Value,
    #[serde(default)]
    pub options: Option<JobOptions>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response to a job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    pub id: String,
    pub backend: String,
}

/// Status plus the reason for failure or cancellation, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    pub reason: Option<String>,
}

/// Job status as reported by `GET /v1/jobs/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    pub status: JobStatus,
    pub state: JobState,
    pub program_id: String,
    pub backend: String,
    pub session_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        JobStatusResponse {
            id: job.id.clone(),
            status: job.status,
            state: JobState {
                status: job.status,
                reason: job.error_message.clone(),
            },
            program_id: job.program_id.clone(),
            backend: job.backend_name.clone(),
            session_id: job.session_id.clone(),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// Confirmation returned after a successful cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJobResponse {
    pub message: String,
}
