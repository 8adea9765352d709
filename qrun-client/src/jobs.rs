//! Job-related API endpoints

use crate::QrunClient;
use crate::error::{ClientError, Result};
use qrun_core::dto::job::{CancelJobResponse, CreateJob, JobCreated, JobStatusResponse};
use serde_json::Value;
use std::time::Duration;

impl QrunClient {
    /// Submit a job
    ///
    /// # Returns
    /// The new job's ID and backend; the job starts out `QUEUED`
    pub async fn create_job(&self, req: &CreateJob) -> Result<JobCreated> {
        let response = self.client.post(self.url("/v1/jobs")).json(req).send().await?;

        self.handle_response(response).await
    }

    /// List all jobs, oldest first
    pub async fn list_jobs(&self) -> Result<Vec<JobStatusResponse>> {
        let response = self.client.get(self.url("/v1/jobs")).send().await?;

        self.handle_response(response).await
    }

    /// Get a job's status by ID
    pub async fn get_job(&self, job_id: &str) -> Result<JobStatusResponse> {
        let url = self.url(&format!("/v1/jobs/{}", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Fetch the result payload of a completed job
    ///
    /// The server answers 400 while the job is not `COMPLETED`.
    pub async fn job_results(&self, job_id: &str) -> Result<Value> {
        let url = self.url(&format!("/v1/jobs/{}/results", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Cancel a queued job
    pub async fn cancel_job(&self, job_id: &str) -> Result<CancelJobResponse> {
        let url = self.url(&format!("/v1/jobs/{}", job_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_response(response).await
    }

    /// Poll a job until it reaches a final state
    ///
    /// # Arguments
    /// * `poll_interval` - Delay between status requests
    /// * `timeout` - Upper bound on the total wait
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<JobStatusResponse> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let job = self.get_job(job_id).await?;
            if job.status.is_terminal() {
                return Ok(job);
            }

            tracing::debug!("Job {} is {}, polling again", job_id, job.status);

            if tokio::time::Instant::now() + poll_interval > deadline {
                return Err(ClientError::Timeout {
                    job_id: job_id.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
