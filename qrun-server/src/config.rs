//! Server configuration
//!
//! Defines the listen address, the executors to register and the tuning
//! knobs for the built-in executor, the worker and the session sweeper.

use std::time::Duration;

use crate::executor::{BUILTIN_EXECUTORS, MAX_SUPPORTED_QUBITS, StatevectorConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address (e.g., "0.0.0.0:8000")
    pub bind_addr: String,

    /// Executor names to register, each a built-in kind
    pub executors: Vec<String>,

    /// Advertised width of the `statevector_simulator` backend
    pub statevector_num_qubits: u32,

    /// Shots used when neither the work unit nor the job options set them
    pub default_shots: u64,

    /// RNG seed for reproducible sampling
    pub seed: Option<u64>,

    /// Largest circuit the built-in executor will simulate
    pub max_simulated_qubits: usize,

    /// How long shutdown waits for the worker to finish its current job
    pub shutdown_timeout: Duration,

    /// Period of the expired-session sweep; zero disables it
    pub session_cleanup_interval: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - QRUN_BIND_ADDR (default: 0.0.0.0:8000)
    /// - QRUN_EXECUTORS (comma-separated, default: aer)
    /// - QRUN_STATEVECTOR_NUM_QUBITS (default: 30)
    /// - QRUN_DEFAULT_SHOTS (default: 1024)
    /// - QRUN_SEED (default: unset)
    /// - QRUN_MAX_SIMULATED_QUBITS (default: 24)
    /// - QRUN_SHUTDOWN_TIMEOUT (seconds, default: 5)
    /// - QRUN_SESSION_CLEANUP_INTERVAL (seconds, default: 60, 0 disables)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = lookup("QRUN_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let executors = match lookup("QRUN_EXECUTORS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.executors,
        };

        let statevector_num_qubits =
            parse_var(&lookup, "QRUN_STATEVECTOR_NUM_QUBITS")?.unwrap_or(defaults.statevector_num_qubits);
        let default_shots = parse_var(&lookup, "QRUN_DEFAULT_SHOTS")?.unwrap_or(defaults.default_shots);
        let seed = parse_var(&lookup, "QRUN_SEED")?;
        let max_simulated_qubits =
            parse_var(&lookup, "QRUN_MAX_SIMULATED_QUBITS")?.unwrap_or(defaults.max_simulated_qubits);

        let shutdown_timeout = parse_var(&lookup, "QRUN_SHUTDOWN_TIMEOUT")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_timeout);

        let session_cleanup_interval = parse_var(&lookup, "QRUN_SESSION_CLEANUP_INTERVAL")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_cleanup_interval);

        Ok(Self {
            bind_addr,
            executors,
            statevector_num_qubits,
            default_shots,
            seed,
            max_simulated_qubits,
            shutdown_timeout,
            session_cleanup_interval,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.executors.is_empty() {
            anyhow::bail!("at least one executor must be configured");
        }

        if let Some(unknown) = self
            .executors
            .iter()
            .find(|e| !BUILTIN_EXECUTORS.contains(&e.as_str()))
        {
            anyhow::bail!(
                "unknown executor '{}' (available: {})",
                unknown,
                BUILTIN_EXECUTORS.join(", ")
            );
        }

        if self.statevector_num_qubits == 0 {
            anyhow::bail!("statevector_num_qubits must be greater than 0");
        }

        if self.default_shots == 0 {
            anyhow::bail!("default_shots must be greater than 0");
        }

        if self.max_simulated_qubits == 0 {
            anyhow::bail!("max_simulated_qubits must be greater than 0");
        }

        if self.max_simulated_qubits > MAX_SUPPORTED_QUBITS {
            anyhow::bail!(
                "max_simulated_qubits must be at most {}",
                MAX_SUPPORTED_QUBITS
            );
        }

        Ok(())
    }

    /// Settings for the built-in statevector executor
    pub fn statevector(&self) -> StatevectorConfig {
        StatevectorConfig {
            default_shots: self.default_shots,
            seed: self.seed,
            max_qubits: self.max_simulated_qubits,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid value for {}: '{}' ({})", key, raw, e)),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            executors: vec!["aer".to_string()],
            statevector_num_qubits: 30,
            default_shots: 1024,
            seed: None,
            max_simulated_qubits: 24,
            shutdown_timeout: Duration::from_secs(5),
            session_cleanup_interval: Duration::from_secs(60),
        }
    }
}
