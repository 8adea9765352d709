use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod codec;
pub mod config;
pub mod executor;
pub mod metadata;
pub mod service;

use crate::config::Config;
use crate::executor::ExecutorRegistry;
use crate::metadata::MetadataProvider;
use crate::service::job_service::JobManager;
use crate::service::session_service::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrun_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting qrun server...");

    let config = load_config();
    tracing::info!("Configuration: {:?}", config);

    let executors = ExecutorRegistry::from_builtin(&config.executors, &config.statevector())
        .context("Failed to register executors")?;
    tracing::info!("Registered executors: {:?}", executors.names());

    let metadata = Arc::new(MetadataProvider::new(
        executors.names(),
        config.statevector_num_qubits,
    ));
    let sessions = Arc::new(SessionStore::new());
    let jobs = Arc::new(JobManager::spawn(
        executors,
        Arc::clone(&metadata),
        Arc::clone(&sessions),
        config.shutdown_timeout,
    ));

    let sweeper = spawn_session_sweeper(Arc::clone(&sessions), config.session_cleanup_interval);

    // Build router with all API endpoints
    let app = api::create_router(api::AppState {
        jobs: Arc::clone(&jobs),
        sessions,
        metadata,
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    jobs.shutdown().await;

    tracing::info!("qrun server stopped");
    Ok(())
}

/// Loads configuration from the environment, falling back to defaults
fn load_config() -> Config {
    match Config::from_env() {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::error!("Invalid configuration: {}; using defaults", e);
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to load configuration: {}; using defaults", e);
            Config::default()
        }
    }
}

/// Periodically removes sessions that outlived their TTL
fn spawn_session_sweeper(
    sessions: Arc<SessionStore>,
    interval: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval.is_zero() {
        tracing::info!("Session cleanup disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired_sessions();
            if removed > 0 {
                tracing::info!("Cleaned up {} expired session(s)", removed);
            }
        }
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
