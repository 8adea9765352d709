//! Backend metadata provider
//!
//! Resolves virtual backend names of the form `"<metadata>@<executor>"` and
//! serves the device catalogue the API lists.

use qrun_core::domain::backend::{BackendConfiguration, BackendMetadata};

/// Name of the all-to-all simulator metadata entry
pub const STATEVECTOR_SIMULATOR: &str = "statevector_simulator";

const LEGACY_BASIS_GATES: [&str; 6] = ["id", "rz", "sx", "x", "cx", "reset"];

const LINEAR_5Q: &[[u32; 2]] = &[[0, 1], [1, 0], [1, 2], [2, 1], [2, 3], [3, 2], [3, 4], [4, 3]];

const T_SHAPED_5Q: &[[u32; 2]] = &[[0, 1], [1, 0], [1, 2], [2, 1], [1, 3], [3, 1], [3, 4], [4, 3]];

const H_SHAPED_7Q: &[[u32; 2]] = &[
    [0, 1],
    [1, 0],
    [1, 2],
    [2, 1],
    [1, 3],
    [3, 1],
    [3, 5],
    [5, 3],
    [4, 5],
    [5, 4],
    [5, 6],
    [6, 5],
];

/// Device families shipped with the server: (names, qubits, coupling map)
const FAKE_DEVICES: &[(&[&str], u32, &[[u32; 2]])] = &[
    (
        &["fake_manila", "fake_athens", "fake_bogota", "fake_santiago"],
        5,
        LINEAR_5Q,
    ),
    (&["fake_lima", "fake_belem", "fake_quito"], 5, T_SHAPED_5Q),
    (
        &[
            "fake_nairobi",
            "fake_jakarta",
            "fake_lagos",
            "fake_perth",
            "fake_casablanca",
        ],
        7,
        H_SHAPED_7Q,
    ),
];

/// Provider of backend metadata for a fixed set of executors
#[derive(Debug, Clone)]
pub struct MetadataProvider {
    executors: Vec<String>,
    catalogue: Vec<BackendMetadata>,
}

impl MetadataProvider {
    /// Creates a provider serving the built-in catalogue for `executors`
    ///
    /// `statevector_num_qubits` sets the advertised width of the
    /// `statevector_simulator` entry.
    pub fn new(executors: Vec<String>, statevector_num_qubits: u32) -> Self {
        let mut catalogue: Vec<BackendMetadata> = FAKE_DEVICES
            .iter()
            .flat_map(|(names, num_qubits, coupling)| {
                names.iter().map(move |name| BackendMetadata {
                    name: name.to_string(),
                    num_qubits: *num_qubits,
                    basis_gates: LEGACY_BASIS_GATES.iter().map(|g| g.to_string()).collect(),
                    coupling_map: Some(coupling.to_vec()),
                    simulator: false,
                })
            })
            .collect();

        catalogue.push(BackendMetadata {
            name: STATEVECTOR_SIMULATOR.to_string(),
            num_qubits: statevector_num_qubits,
            basis_gates: [
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "rx", "ry", "rz", "p",
                "u", "cx", "cy", "cz", "swap", "ccx",
            ]
            .iter()
            .map(|g| g.to_string())
            .collect(),
            coupling_map: None,
            simulator: true,
        });

        Self {
            executors,
            catalogue,
        }
    }

    /// Executor names this provider accepts
    pub fn executors(&self) -> &[String] {
        &self.executors
    }

    /// Splits a virtual backend name into `(metadata, executor)`
    ///
    /// Returns `None` unless the name contains `@`, the executor part is a
    /// configured executor and the metadata part is in the catalogue.
    pub fn parse_backend_name(&self, backend_name: &str) -> Option<(String, String)> {
        let (metadata, executor) = backend_name.rsplit_once('@')?;

        if metadata.is_empty() || executor.is_empty() {
            return None;
        }

        if !self.executors.iter().any(|e| e == executor) {
            return None;
        }

        self.get_backend(metadata)?;

        Some((metadata.to_string(), executor.to_string()))
    }

    /// Looks up device metadata by its bare name (no executor suffix)
    pub fn get_backend(&self, metadata_name: &str) -> Option<&BackendMetadata> {
        self.catalogue.iter().find(|b| b.name == metadata_name)
    }

    /// Lists every metadata × executor combination
    pub fn list_backends(&self) -> Vec<BackendConfiguration> {
        self.executors
            .iter()
            .flat_map(|executor| {
                self.catalogue
                    .iter()
                    .map(move |metadata| BackendConfiguration::virtual_backend(metadata, executor))
            })
            .collect()
    }

    /// Configuration of a single virtual backend
    pub fn configuration(&self, backend_name: &str) -> Option<BackendConfiguration> {
        let (metadata, executor) = self.parse_backend_name(backend_name)?;
        let metadata = self.get_backend(&metadata)?;
        Some(BackendConfiguration::virtual_backend(metadata, &executor))
    }
}
