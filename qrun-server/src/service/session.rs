//! Session Service
//!
//! Owns session records and enforces session admission rules. All mutations
//! happen under a single store-wide lock; callers receive copies.

use chrono::{DateTime, Utc};
use qrun_core::domain::session::{Session, SessionMode, SessionView};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};
use uuid::Uuid;

/// In-memory session store
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a new session that accepts jobs
    ///
    /// The backend name is expected to be validated by the caller.
    pub fn create_session(
        &self,
        mode: SessionMode,
        backend_name: String,
        instance: Option<String>,
        max_ttl: u64,
    ) -> String {
        let id = format!("session-{}", Uuid::new_v4());

        let session = Session {
            id: id.clone(),
            mode,
            backend_name,
            instance,
            max_ttl,
            created_at: Utc::now(),
            accepting_jobs: true,
            active: true,
            job_ids: Vec::new(),
        };

        info!(
            "Session created: {} (mode: {}, backend: {})",
            id, session.mode, session.backend_name
        );
        self.sessions().insert(id.clone(), session);

        id
    }

    /// Get a copy of a session
    pub fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions().get(id).cloned()
    }

    /// Get the API view of a session, including elapsed time
    pub fn get_session_view(&self, id: &str) -> Option<SessionView> {
        let now = Utc::now();
        self.sessions().get(id).map(|s| s.view_at(now))
    }

    /// Snapshot of every session's view, oldest first
    pub fn list_sessions(&self) -> Vec<SessionView> {
        let now = Utc::now();
        let mut views: Vec<SessionView> = self.sessions().values().map(|s| s.view_at(now)).collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        views
    }

    /// Sets whether the session admits new jobs; `active` is left untouched
    pub fn update_session(&self, id: &str, accepting_jobs: bool) -> bool {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(id) else {
            return false;
        };

        session.accepting_jobs = accepting_jobs;
        info!("Session {} updated: accepting_jobs={}", id, accepting_jobs);
        true
    }

    /// Stops intake and deactivates the session; running jobs are unaffected
    pub fn close_session(&self, id: &str) -> bool {
        if self.deactivate(id) {
            info!("Session closed: {}", id);
            true
        } else {
            false
        }
    }

    /// Stops intake and deactivates the session
    ///
    /// Cancelling the session's queued jobs is the job manager's concern
    /// (`JobManager::cancel_session_jobs`).
    pub fn cancel_session(&self, id: &str) -> bool {
        if self.deactivate(id) {
            info!("Session cancelled: {}", id);
            true
        } else {
            false
        }
    }

    fn deactivate(&self, id: &str) -> bool {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(id) else {
            return false;
        };

        session.accepting_jobs = false;
        session.active = false;
        true
    }

    /// Appends a job to the session if it exists and is accepting jobs
    pub fn add_job_to_session(&self, id: &str, job_id: &str) -> bool {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(id) else {
            return false;
        };

        if !session.accepting_jobs {
            warn!("Session {} is not accepting jobs, rejecting {}", id, job_id);
            return false;
        }

        session.job_ids.push(job_id.to_string());
        info!("Job {} added to session {}", job_id, id);
        true
    }

    /// Whether `backend_name` is exactly the session's bound backend
    pub fn validate_job_backend(&self, id: &str, backend_name: &str) -> bool {
        self.sessions()
            .get(id)
            .is_some_and(|s| s.backend_name == backend_name)
    }

    /// Removes every session that outlived its TTL; member jobs are kept
    pub fn cleanup_expired_sessions(&self) -> usize {
        self.cleanup_expired_at(Utc::now())
    }

    fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();

        sessions.retain(|id, session| {
            let expired = session.is_expired(now);
            if expired {
                info!("Expired session cleaned up: {}", id);
            }
            !expired
        });

        before - sessions.len()
    }
}
