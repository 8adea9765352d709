//! Executor layer
//!
//! Executors perform the numeric work of a job: they receive the decoded
//! work units plus the job options and return an opaque result payload.
//! The job manager only ever sees them through the [`Executor`] trait.

mod circuit;
mod statevector;

pub use statevector::{MAX_SUPPORTED_QUBITS, StatevectorConfig, StatevectorExecutor};

use async_trait::async_trait;
use qrun_core::domain::job::JobOptions;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors an executor reports for a work-unit batch
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid work unit {index}: {reason}")]
    InvalidWorkUnit { index: usize, reason: String },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Unsupported gate: {0}")]
    UnsupportedGate(String),

    #[error("Invalid gate: {0}")]
    InvalidGate(String),

    #[error("Circuit requires {requested} qubits but the executor simulates at most {limit}")]
    TooManyQubits { requested: usize, limit: usize },

    #[error("Executor failure: {0}")]
    Internal(String),
}

/// Capability that executes primitive programs
///
/// `backend` is the metadata part of the job's backend name (for example
/// `fake_manila`); implementations may use it for noise modelling or ignore it.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Registry name of this executor (the part after `@` in backend names)
    fn name(&self) -> &str;

    /// Samples measurement outcomes for each work unit
    ///
    /// Honours the `default_shots` option for work units without their own shots.
    async fn execute_sampler(
        &self,
        work_units: Vec<Value>,
        options: &JobOptions,
        backend: &str,
    ) -> Result<Value, ExecutorError>;

    /// Estimates observable expectation values for each work unit
    ///
    /// Honours the `default_precision` option for work units without their own precision.
    async fn execute_estimator(
        &self,
        work_units: Vec<Value>,
        options: &JobOptions,
        backend: &str,
    ) -> Result<Value, ExecutorError>;
}

/// Executor kinds this build can instantiate from configuration
pub const BUILTIN_EXECUTORS: &[&str] = &["aer"];

/// Immutable mapping from executor name to executor
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an executor under its own name, replacing any previous entry
    pub fn with(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executors
            .insert(executor.name().to_string(), executor);
        self
    }

    /// Builds the registry for the configured built-in executor names
    pub fn from_builtin(names: &[String], config: &StatevectorConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        for name in names {
            match name.as_str() {
                "aer" => {
                    registry = registry.with(Arc::new(StatevectorExecutor::new(
                        name.clone(),
                        config.clone(),
                    )));
                }
                other => anyhow::bail!("Unknown executor kind: {}", other),
            }
        }
        Ok(registry)
    }

    /// Looks up an executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.executors.get(name).cloned()
    }

    /// Registered executor names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.names())
            .finish()
    }
}
