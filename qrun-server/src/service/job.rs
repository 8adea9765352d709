//! Job Service
//!
//! Job admission, the FIFO queue and the single background worker.
//!
//! Every job goes through exactly one worker task, so at most one job is
//! `RUNNING` at any instant and jobs start in admission order. The worker
//! only ever holds the store lock for bookkeeping, never across execution.

use qrun_core::domain::job::{Job, JobOptions, JobStatus, ProgramKind};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::codec;
use crate::executor::{ExecutorError, ExecutorRegistry};
use crate::metadata::MetadataProvider;
use crate::service::session_service::SessionStore;

const CANCELLED_BY_USER: &str = "Cancelled by user";
const CANCELLED_BY_SESSION: &str = "Cancelled due to session cancellation";

/// Admission errors, reported synchronously by [`JobManager::create_job`]
#[derive(Debug, Error, PartialEq)]
pub enum JobError {
    #[error("Backend not found or invalid: {0}")]
    InvalidBackend(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(
        "Backend mismatch: job backend '{job_backend}' does not match session backend '{session_backend}'"
    )]
    BackendMismatch {
        job_backend: String,
        session_backend: String,
    },

    #[error("Session {0} is not accepting new jobs")]
    SessionNotAccepting(String),
}

/// Failures captured by the worker and recorded on the job
#[derive(Debug, Error)]
enum ExecutionError {
    #[error("Invalid backend name: {0}")]
    InvalidBackend(String),

    #[error("Executor not found: {0}")]
    ExecutorNotFound(String),

    #[error("{0}")]
    UnknownProgram(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// State shared between request handlers and the worker
struct Inner {
    jobs: Mutex<HashMap<String, Job>>,
    executors: ExecutorRegistry,
    metadata: Arc<MetadataProvider>,
}

/// Job store, FIFO queue and worker handle
pub struct JobManager {
    inner: Arc<Inner>,
    sessions: Arc<SessionStore>,
    queue: mpsc::UnboundedSender<String>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl JobManager {
    /// Creates the manager and starts its worker on the current tokio runtime
    pub fn spawn(
        executors: ExecutorRegistry,
        metadata: Arc<MetadataProvider>,
        sessions: Arc<SessionStore>,
        shutdown_timeout: Duration,
    ) -> Self {
        let inner = Arc::new(Inner {
            jobs: Mutex::new(HashMap::new()),
            executors,
            metadata,
        });

        let (queue, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(run_worker(Arc::clone(&inner), queue_rx, shutdown_rx));
        info!("Job worker spawned");

        Self {
            inner,
            sessions,
            queue,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
            shutdown_timeout,
        }
    }

    /// Admits a job and enqueues it
    ///
    /// Validation happens before anything is stored: the backend must
    /// resolve, and a referenced session must exist, be bound to exactly
    /// this backend and be accepting jobs.
    pub fn create_job(
        &self,
        program_id: String,
        backend_name: String,
        params: Value,
        options: JobOptions,
        session_id: Option<String>,
    ) -> Result<String, JobError> {
        if self.inner.metadata.parse_backend_name(&backend_name).is_none() {
            return Err(JobError::InvalidBackend(backend_name));
        }

        if let Some(session_id) = &session_id {
            let session = self
                .sessions
                .get_session(session_id)
                .ok_or_else(|| JobError::SessionNotFound(session_id.clone()))?;

            if !self.sessions.validate_job_backend(session_id, &backend_name) {
                return Err(JobError::BackendMismatch {
                    job_backend: backend_name,
                    session_backend: session.backend_name,
                });
            }

            if !session.accepting_jobs {
                return Err(JobError::SessionNotAccepting(session_id.clone()));
            }
        }

        let id = format!("job-{}", Uuid::new_v4());
        let job = Job::queued(
            id.clone(),
            program_id,
            backend_name,
            params,
            options,
            session_id.clone(),
        );

        {
            // The job only becomes visible once its session accepted it.
            let mut jobs = self.inner.jobs();
            if let Some(session_id) = &session_id {
                if !self.sessions.add_job_to_session(session_id, &id) {
                    return Err(match self.sessions.get_session(session_id) {
                        Some(_) => JobError::SessionNotAccepting(session_id.clone()),
                        None => JobError::SessionNotFound(session_id.clone()),
                    });
                }
            }
            jobs.insert(id.clone(), job);
        }

        if self.queue.send(id.clone()).is_err() {
            warn!("Job worker is not running; {} will stay queued", id);
        }

        info!(
            "Job created and queued: {} (session: {})",
            id,
            session_id.as_deref().unwrap_or("none")
        );

        Ok(id)
    }

    /// Get a copy of a job
    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.inner.jobs().get(id).cloned()
    }

    /// Point-in-time copy of every job
    pub fn list_jobs(&self) -> HashMap<String, Job> {
        self.inner.jobs().clone()
    }

    /// Cancels a job that has not started yet
    ///
    /// Returns `false` for unknown jobs and for any status other than
    /// `QUEUED`; running jobs are never interrupted.
    pub fn cancel_job(&self, id: &str) -> bool {
        let mut jobs = self.inner.jobs();
        let Some(job) = jobs.get_mut(id) else {
            return false;
        };

        if job.status != JobStatus::Queued {
            debug!("Job {} not cancelled (status: {})", id, job.status);
            return false;
        }

        mark_cancelled(job, CANCELLED_BY_USER);
        info!("Job cancelled: {}", id);
        true
    }

    /// Cancels every queued job of a session, returning how many changed
    pub fn cancel_session_jobs(&self, session_id: &str) -> usize {
        let mut jobs = self.inner.jobs();
        let mut cancelled = 0;

        for job in jobs.values_mut() {
            if job.session_id.as_deref() == Some(session_id) && job.status == JobStatus::Queued {
                mark_cancelled(job, CANCELLED_BY_SESSION);
                cancelled += 1;
            }
        }

        info!("Cancelled {} job(s) from session {}", cancelled, session_id);
        cancelled
    }

    /// Number of queued or running jobs, optionally only those on `executor`
    pub fn get_queue_length(&self, executor: Option<&str>) -> usize {
        let jobs = self.inner.jobs();
        jobs.values()
            .filter(|job| job.status.is_pending())
            .filter(|job| match executor {
                None => true,
                Some(name) => self
                    .inner
                    .metadata
                    .parse_backend_name(&job.backend_name)
                    .is_some_and(|(_, e)| e == name),
            })
            .count()
    }

    /// Signals the worker to stop after its current job and waits for it
    ///
    /// Queued jobs are left as they are.
    pub async fn shutdown(&self) {
        info!("Shutting down job manager...");
        self.shutdown_tx.send_replace(true);

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(handle) = handle else {
            return;
        };

        match tokio::time::timeout(self.shutdown_timeout, handle).await {
            Ok(Ok(())) => info!("Job worker stopped"),
            Ok(Err(e)) => error!("Job worker terminated abnormally: {}", e),
            Err(_) => warn!(
                "Job worker did not stop within {:?}",
                self.shutdown_timeout
            ),
        }
    }
}

fn mark_cancelled(job: &mut Job, reason: &str) {
    job.status = JobStatus::Cancelled;
    job.completed_at = Some(chrono::Utc::now());
    job.error_message = Some(reason.to_string());
}

impl Inner {
    fn jobs(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves a queued job to `RUNNING`; returns `None` if it must be skipped
    fn begin(&self, id: &str) -> Option<Job> {
        let mut jobs = self.jobs();
        let Some(job) = jobs.get_mut(id) else {
            error!("Job not found: {}", id);
            return None;
        };

        match job.status {
            JobStatus::Queued => {
                job.status = JobStatus::Running;
                job.started_at = Some(chrono::Utc::now());
                Some(job.clone())
            }
            JobStatus::Cancelled => {
                info!("Job {} was cancelled, skipping execution", id);
                None
            }
            other => {
                warn!("Job {} dequeued in unexpected status {}", id, other);
                None
            }
        }
    }

    /// Records the outcome of a running job
    fn finish(&self, id: &str, outcome: Result<Value, String>) {
        let mut jobs = self.jobs();
        let Some(job) = jobs.get_mut(id) else {
            error!("Job vanished during execution: {}", id);
            return;
        };

        if job.status != JobStatus::Running {
            warn!("Ignoring outcome for job {} in status {}", id, job.status);
            return;
        }

        job.completed_at = Some(chrono::Utc::now());
        match outcome {
            Ok(result) => {
                job.status = JobStatus::Completed;
                job.result = Some(result);
                info!("Job completed: {}", id);
            }
            Err(message) => {
                error!("Job failed: {}: {}", id, message);
                job.status = JobStatus::Failed;
                job.error_message = Some(message);
            }
        }
    }

    async fn run_program(&self, job: &Job) -> Result<Value, ExecutionError> {
        let (metadata_name, executor_name) = self
            .metadata
            .parse_backend_name(&job.backend_name)
            .ok_or_else(|| ExecutionError::InvalidBackend(job.backend_name.clone()))?;

        let executor = self
            .executors
            .get(&executor_name)
            .ok_or(ExecutionError::ExecutorNotFound(executor_name))?;

        let params = match codec::decode_params(&job.params) {
            Ok(params) => params,
            Err(e) => {
                warn!(
                    "Failed to decode params for job {}: {}; passing raw params",
                    job.id, e
                );
                job.params.clone()
            }
        };
        let work_units = codec::work_units(&params);

        let kind: ProgramKind = job
            .program_id
            .parse()
            .map_err(ExecutionError::UnknownProgram)?;

        let result = match kind {
            ProgramKind::Sampler => {
                executor
                    .execute_sampler(work_units, &job.options, &metadata_name)
                    .await?
            }
            ProgramKind::Estimator => {
                executor
                    .execute_estimator(work_units, &job.options, &metadata_name)
                    .await?
            }
        };

        Ok(result)
    }
}

/// Worker loop: takes job ids in FIFO order and runs them one at a time
async fn run_worker(
    inner: Arc<Inner>,
    mut queue: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Job worker started");

    loop {
        let job_id = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = queue.recv() => match next {
                Some(id) => id,
                None => break,
            },
        };

        info!("Worker picked up job: {}", job_id);

        let Some(job) = inner.begin(&job_id) else {
            continue;
        };

        info!(
            "Executing job {}: {} on {}",
            job.id, job.program_id, job.backend_name
        );

        // Run on its own task so a panicking executor only fails this job.
        let task_inner = Arc::clone(&inner);
        let task = tokio::spawn(async move {
            task_inner
                .run_program(&job)
                .await
                .map_err(|e| e.to_string())
        });

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(format!("Job execution panicked: {}", e)),
        };
        inner.finish(&job_id, outcome);

        if *shutdown.borrow() {
            break;
        }
    }

    info!("Job worker stopped");
}
