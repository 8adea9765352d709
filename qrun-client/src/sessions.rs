//! Session-related API endpoints

use crate::QrunClient;
use crate::error::Result;
use qrun_core::domain::session::SessionView;
use qrun_core::dto::session::{CreateSession, UpdateSession};

impl QrunClient {
    /// Open a session bound to one backend
    pub async fn create_session(&self, req: &CreateSession) -> Result<SessionView> {
        let response = self
            .client
            .post(self.url("/v1/sessions"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List all sessions
    pub async fn list_sessions(&self) -> Result<Vec<SessionView>> {
        let response = self.client.get(self.url("/v1/sessions")).send().await?;

        self.handle_response(response).await
    }

    /// Get a session by ID
    pub async fn get_session(&self, session_id: &str) -> Result<SessionView> {
        let url = self.url(&format!("/v1/sessions/{}", session_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Toggle whether a session admits new jobs
    pub async fn update_session(&self, session_id: &str, accepting_jobs: bool) -> Result<SessionView> {
        let url = self.url(&format!("/v1/sessions/{}", session_id));
        let response = self
            .client
            .patch(&url)
            .json(&UpdateSession { accepting_jobs })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Close a session; its queued jobs still run
    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        let url = self.url(&format!("/v1/sessions/{}/close", session_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Cancel a session together with its queued jobs
    pub async fn cancel_session(&self, session_id: &str) -> Result<()> {
        let url = self.url(&format!("/v1/sessions/{}/cancel", session_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
