//! Backend metadata types
//!
//! A virtual backend is the combination of device metadata (topology) and an
//! executor, addressed as `"<metadata>@<executor>"`.

use serde::{Deserialize, Serialize};

/// Static description of a device topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendMetadata {
    pub name: String,
    pub num_qubits: u32,
    pub basis_gates: Vec<String>,
    /// Directed qubit pairs; `None` means all-to-all connectivity
    pub coupling_map: Option<Vec<[u32; 2]>>,
    pub simulator: bool,
}

/// Configuration of a virtual backend as reported by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    pub backend_name: String,
    pub backend_version: String,
    pub n_qubits: u32,
    pub basis_gates: Vec<String>,
    pub coupling_map: Option<Vec<[u32; 2]>>,
    pub simulator: bool,
    pub local: bool,
    pub conditional: bool,
    pub open_pulse: bool,
    pub memory: bool,
    pub max_shots: u64,
    pub max_experiments: u32,
    /// Executor that runs jobs for this backend
    pub executor: String,
}

impl BackendConfiguration {
    /// Builds the configuration of `metadata` served by `executor`
    pub fn virtual_backend(metadata: &BackendMetadata, executor: &str) -> Self {
        Self {
            backend_name: format!("{}@{}", metadata.name, executor),
            backend_version: "1.0.0".to_string(),
            n_qubits: metadata.num_qubits,
            basis_gates: metadata.basis_gates.clone(),
            coupling_map: metadata.coupling_map.clone(),
            simulator: metadata.simulator,
            local: true,
            conditional: false,
            open_pulse: false,
            memory: true,
            max_shots: 100_000,
            max_experiments: 300,
            executor: executor.to_string(),
        }
    }
}
