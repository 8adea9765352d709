//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod backend;
pub mod error;
pub mod health;
pub mod job;
pub mod session;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::metadata::MetadataProvider;
use crate::service::job_service::JobManager;
use crate::service::session_service::SessionStore;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobManager>,
    pub sessions: Arc<SessionStore>,
    pub metadata: Arc<MetadataProvider>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Server info and health
        .route("/", get(backend::server_info))
        .route("/health", get(health::health_check))
        // Backend endpoints
        .route("/v1/backends", get(backend::list_backends))
        .route(
            "/v1/backends/{name}/configuration",
            get(backend::get_backend_configuration),
        )
        .route(
            "/v1/backends/{name}/properties",
            get(backend::get_backend_properties),
        )
        .route("/v1/backends/{name}/status", get(backend::get_backend_status))
        // Job endpoints
        .route("/v1/jobs", post(job::create_job).get(job::list_jobs))
        .route("/v1/jobs/{id}", get(job::get_job).delete(job::cancel_job))
        .route("/v1/jobs/{id}/results", get(job::get_job_results))
        // Session endpoints
        .route(
            "/v1/sessions",
            post(session::create_session).get(session::list_sessions),
        )
        .route(
            "/v1/sessions/{id}",
            get(session::get_session).patch(session::update_session),
        )
        .route("/v1/sessions/{id}/close", delete(session::close_session))
        .route("/v1/sessions/{id}/cancel", delete(session::cancel_session))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorRegistry, StatevectorConfig};
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    const BACKEND: &str = "fake_manila@aer";

    fn test_app() -> Router {
        let config = StatevectorConfig {
            seed: Some(11),
            ..StatevectorConfig::default()
        };
        let executors = ExecutorRegistry::from_builtin(&["aer".to_string()], &config).unwrap();
        let metadata = Arc::new(MetadataProvider::new(executors.names(), 30));
        let sessions = Arc::new(SessionStore::new());
        let jobs = Arc::new(JobManager::spawn(
            executors,
            Arc::clone(&metadata),
            Arc::clone(&sessions),
            Duration::from_secs(2),
        ));

        create_router(AppState {
            jobs,
            sessions,
            metadata,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    fn bell_params() -> Value {
        json!({"pubs": [[
            {"num_qubits": 2, "gates": [
                {"name": "h", "qubits": [0]},
                {"name": "cx", "qubits": [0, 1]}
            ]},
            null,
            64
        ]]})
    }

    async fn wait_for_terminal(app: &Router, id: &str) -> Value {
        for _ in 0..200 {
            let (_, job) = send(app, Method::GET, &format!("/v1/jobs/{}", id), None).await;
            if matches!(job["status"].as_str(), Some("COMPLETED" | "FAILED" | "CANCELLED")) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }

    #[tokio::test]
    async fn test_health_and_server_info() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["executors"], json!(["aer"]));
    }

    #[tokio::test]
    async fn test_backend_discovery() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/v1/backends", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["devices"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["backend_name"].as_str())
            .collect();
        assert!(names.contains(&BACKEND));
        assert!(names.contains(&"statevector_simulator@aer"));

        let (status, body) = send(
            &app,
            Method::GET,
            "/v1/backends/fake_manila@aer/configuration",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["n_qubits"], 5);

        let (status, _) = send(&app, Method::GET, "/v1/backends/fake_manila/configuration", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_backend_properties_and_status() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/v1/backends/fake_manila@aer/properties", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Properties not available"));

        let (status, body) = send(&app, Method::GET, "/v1/backends/nope@aer/properties", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, body) = send(&app, Method::GET, "/v1/backends/fake_manila@aer/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], true);
        assert_eq!(body["status"], "active");
        assert_eq!(body["length_queue"], 0);
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let app = test_app();

        let (status, created) = send(
            &app,
            Method::POST,
            "/v1/jobs",
            Some(json!({"program_id": "sampler", "backend": BACKEND, "params": bell_params()})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(created["backend"], BACKEND);
        let id = created["id"].as_str().unwrap().to_string();

        let job = wait_for_terminal(&app, &id).await;
        assert_eq!(job["status"], "COMPLETED");
        assert_eq!(job["state"]["status"], "COMPLETED");
        assert_eq!(job["program_id"], "sampler");

        let (status, result) = send(&app, Method::GET, &format!("/v1/jobs/{}/results", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let counts = result["pub_results"][0]["data"]["counts"].as_object().unwrap();
        let total: u64 = counts.values().filter_map(Value::as_u64).sum();
        assert_eq!(total, 64);

        let (status, body) = send(&app, Method::DELETE, &format!("/v1/jobs/{}", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot cancel job in COMPLETED status");

        let (status, list) = send(&app, Method::GET, "/v1/jobs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_job_admission_errors_are_not_found() {
        let app = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/jobs",
            Some(json!({"program_id": "sampler", "backend": "fake_manila", "params": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/jobs",
            Some(json!({
                "program_id": "sampler",
                "backend": BACKEND,
                "params": {},
                "session_id": "session-missing"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, _) = send(&app, Method::GET, "/v1/jobs/job-missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/v1/jobs/job-missing/results", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, "/v1/jobs/job-missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_job_has_reason_and_no_results() {
        let app = test_app();

        let (_, created) = send(
            &app,
            Method::POST,
            "/v1/jobs",
            Some(json!({"program_id": "bogus", "backend": BACKEND, "params": bell_params()})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let job = wait_for_terminal(&app, &id).await;
        assert_eq!(job["status"], "FAILED");
        assert!(job["state"]["reason"].as_str().unwrap().contains("bogus"));

        let (status, _) = send(&app, Method::GET, &format!("/v1/jobs/{}/results", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = test_app();

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/sessions",
            Some(json!({"mode": "dedicated", "backend": "fake_manila"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, session) = send(
            &app,
            Method::POST,
            "/v1/sessions",
            Some(json!({"mode": "batch", "backend": BACKEND, "max_ttl": 600})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["mode"], "batch");
        assert_eq!(session["backend"], BACKEND);
        assert_eq!(session["max_ttl"], 600);
        assert_eq!(session["accepting_jobs"], true);
        let id = session["id"].as_str().unwrap().to_string();
        let uri = format!("/v1/sessions/{}", id);

        let (status, updated) = send(&app, Method::PATCH, &uri, Some(json!({"accepting_jobs": false}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["accepting_jobs"], false);
        assert_eq!(updated["active"], true);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/jobs",
            Some(json!({"program_id": "sampler", "backend": BACKEND, "params": {}, "session_id": id})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not accepting"));

        let (status, _) = send(&app, Method::DELETE, &format!("{}/cancel", uri), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, view) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(view["active"], false);
        assert_eq!(view["jobs"], json!([]));

        let (status, list) = send(&app, Method::GET, "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_job_mismatch_and_close() {
        let app = test_app();

        let (_, session) = send(
            &app,
            Method::POST,
            "/v1/sessions",
            Some(json!({"mode": "dedicated", "backend": BACKEND})),
        )
        .await;
        let id = session["id"].as_str().unwrap().to_string();
        assert_eq!(session["max_ttl"], 28800);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/jobs",
            Some(json!({
                "program_id": "sampler",
                "backend": "fake_lima@aer",
                "params": {},
                "session_id": id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("mismatch"));

        let (status, _) = send(&app, Method::DELETE, &format!("/v1/sessions/{}/close", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::DELETE, "/v1/sessions/session-missing/close", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/v1/sessions/session-missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
