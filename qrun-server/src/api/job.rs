//! Job API Handlers
//!
//! HTTP endpoints for job submission, status, results and cancellation.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use qrun_core::domain::job::JobStatus;
use qrun_core::dto::job::{CancelJobResponse, CreateJob, JobCreated, JobStatusResponse};
use serde_json::Value;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

fn job_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Job {} not found", id))
}

/// POST /v1/jobs
/// Admit a job and queue it for execution
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJob>,
) -> ApiResult<(StatusCode, Json<JobCreated>)> {
    tracing::info!(
        "Submitting {} job to backend: {}",
        req.program_id,
        req.backend
    );

    let id = state.jobs.create_job(
        req.program_id,
        req.backend.clone(),
        req.params,
        req.options.unwrap_or_default(),
        req.session_id,
    )?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreated {
            id,
            backend: req.backend,
        }),
    ))
}

/// GET /v1/jobs
/// List every job, oldest first
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobStatusResponse>> {
    tracing::debug!("Listing all jobs");

    let mut jobs: Vec<_> = state.jobs.list_jobs().into_values().collect();
    jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    Json(jobs.iter().map(JobStatusResponse::from).collect())
}

/// GET /v1/jobs/{id}
/// Get job status by ID
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    tracing::debug!("Getting job: {}", id);

    let job = state.jobs.get_job(&id).ok_or_else(|| job_not_found(&id))?;
    Ok(Json(JobStatusResponse::from(&job)))
}

/// GET /v1/jobs/{id}/results
/// Result payload of a completed job
pub async fn get_job_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    tracing::debug!("Getting results for job: {}", id);

    let job = state.jobs.get_job(&id).ok_or_else(|| job_not_found(&id))?;

    if job.status != JobStatus::Completed {
        return Err(ApiError::BadRequest(format!(
            "Job {} is not completed (status: {})",
            id, job.status
        )));
    }

    Ok(Json(job.result.unwrap_or(Value::Null)))
}

/// DELETE /v1/jobs/{id}
/// Cancel a job that has not started yet
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelJobResponse>> {
    tracing::info!("Cancelling job: {}", id);

    if state.jobs.get_job(&id).is_none() {
        return Err(job_not_found(&id));
    }

    if !state.jobs.cancel_job(&id) {
        // Re-read so the message reflects the status that blocked the cancel.
        let status = state
            .jobs
            .get_job(&id)
            .map(|job| job.status)
            .ok_or_else(|| job_not_found(&id))?;
        return Err(ApiError::BadRequest(format!(
            "Cannot cancel job in {} status",
            status
        )));
    }

    Ok(Json(CancelJobResponse {
        message: "Job cancelled".to_string(),
    }))
}
