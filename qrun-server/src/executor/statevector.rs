//! Dense statevector executor
//!
//! Simulates noise-free circuits on the CPU. Sampling measures every qubit
//! at the end of the circuit; expectation values are computed exactly.
//! Bitstrings and Pauli labels are little-endian (rightmost character is qubit 0).

use async_trait::async_trait;
use num_complex::Complex64;
use qrun_core::domain::job::JobOptions;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::f64::consts::FRAC_1_SQRT_2;
use tracing::debug;

use super::circuit::{Bindings, Circuit, Instruction, parse_estimator_pub, parse_sampler_pub};
use super::{Executor, ExecutorError};

/// Widest register the executor will ever allocate, whatever the configuration
pub const MAX_SUPPORTED_QUBITS: usize = 30;

/// Tuning knobs of the statevector executor
#[derive(Debug, Clone)]
pub struct StatevectorConfig {
    /// Shots used when neither the work unit nor `default_shots` sets them
    pub default_shots: u64,

    /// Fixed RNG seed for reproducible sampling
    pub seed: Option<u64>,

    /// Largest circuit width that will be simulated
    pub max_qubits: usize,
}

impl Default for StatevectorConfig {
    fn default() -> Self {
        Self {
            default_shots: 1024,
            seed: None,
            max_qubits: 24,
        }
    }
}

/// CPU statevector executor
#[derive(Debug, Clone)]
pub struct StatevectorExecutor {
    name: String,
    config: StatevectorConfig,
}

impl StatevectorExecutor {
    pub fn new(name: impl Into<String>, config: StatevectorConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn simulate(&self, circuit: &Circuit, bindings: &Bindings) -> Result<Statevector, ExecutorError> {
        let limit = self.config.max_qubits.min(MAX_SUPPORTED_QUBITS);
        if circuit.num_qubits > limit {
            return Err(ExecutorError::TooManyQubits {
                requested: circuit.num_qubits,
                limit,
            });
        }

        let mut state = Statevector::zero(circuit.num_qubits);
        let mut touched = HashSet::new();
        for instruction in &circuit.gates {
            state.apply(instruction, bindings, &touched)?;
            touched.extend(instruction.qubits.iter().copied());
        }
        Ok(state)
    }

    fn run_sampler(
        &self,
        work_units: &[Value],
        default_shots: u64,
        backend: &str,
    ) -> Result<Value, ExecutorError> {
        let mut rng = self.rng();
        let mut pub_results = Vec::with_capacity(work_units.len());

        for (index, unit) in work_units.iter().enumerate() {
            let invalid = |reason: String| ExecutorError::InvalidWorkUnit { index, reason };

            let sampler_pub = parse_sampler_pub(unit).map_err(invalid)?;
            let shots = sampler_pub.shots.unwrap_or(default_shots);
            let state = self.simulate(&sampler_pub.circuit, &sampler_pub.bindings)?;

            let counts = state.sample(shots, &mut rng);
            pub_results.push(json!({
                "data": { "counts": counts },
                "metadata": {
                    "shots": shots,
                    "num_qubits": sampler_pub.circuit.num_qubits,
                },
            }));
        }

        Ok(self.wrap_result(pub_results, backend))
    }

    fn run_estimator(
        &self,
        work_units: &[Value],
        default_precision: f64,
        backend: &str,
    ) -> Result<Value, ExecutorError> {
        let mut pub_results = Vec::with_capacity(work_units.len());

        for (index, unit) in work_units.iter().enumerate() {
            let invalid = |reason: String| ExecutorError::InvalidWorkUnit { index, reason };

            let estimator_pub = parse_estimator_pub(unit).map_err(invalid)?;
            let precision = estimator_pub.precision.unwrap_or(default_precision);
            let state = self.simulate(&estimator_pub.circuit, &estimator_pub.bindings)?;

            let evs: Vec<f64> = estimator_pub
                .observables
                .iter()
                .map(|observable| {
                    observable
                        .terms
                        .iter()
                        .map(|(label, coeff)| coeff * state.expectation(label))
                        .sum()
                })
                .collect();
            let stds = vec![0.0; evs.len()];

            pub_results.push(json!({
                "data": { "evs": evs, "stds": stds },
                "metadata": { "target_precision": precision },
            }));
        }

        Ok(self.wrap_result(pub_results, backend))
    }

    fn wrap_result(&self, pub_results: Vec<Value>, backend: &str) -> Value {
        json!({
            "pub_results": pub_results,
            "metadata": {
                "executor": self.name,
                "backend": backend,
                "version": 2,
            },
        })
    }
}

#[async_trait]
impl Executor for StatevectorExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute_sampler(
        &self,
        work_units: Vec<Value>,
        options: &JobOptions,
        backend: &str,
    ) -> Result<Value, ExecutorError> {
        let default_shots = match options.get("default_shots") {
            None | Some(Value::Null) => self.config.default_shots,
            Some(value) => value.as_u64().filter(|s| *s > 0).ok_or_else(|| {
                ExecutorError::InvalidOption(format!(
                    "default_shots must be a positive integer, found {}",
                    value
                ))
            })?,
        };

        debug!(
            "Sampling {} work unit(s) on {} with default_shots={}",
            work_units.len(),
            backend,
            default_shots
        );

        let this = self.clone();
        let backend = backend.to_string();
        tokio::task::spawn_blocking(move || this.run_sampler(&work_units, default_shots, &backend))
            .await
            .map_err(|e| ExecutorError::Internal(e.to_string()))?
    }

    async fn execute_estimator(
        &self,
        work_units: Vec<Value>,
        options: &JobOptions,
        backend: &str,
    ) -> Result<Value, ExecutorError> {
        let default_precision = match options.get("default_precision") {
            None | Some(Value::Null) => 0.0,
            Some(value) => value.as_f64().filter(|p| *p >= 0.0).ok_or_else(|| {
                ExecutorError::InvalidOption(format!(
                    "default_precision must be a non-negative number, found {}",
                    value
                ))
            })?,
        };

        debug!(
            "Estimating {} work unit(s) on {} with default_precision={}",
            work_units.len(),
            backend,
            default_precision
        );

        let this = self.clone();
        let backend = backend.to_string();
        tokio::task::spawn_blocking(move || {
            this.run_estimator(&work_units, default_precision, &backend)
        })
        .await
        .map_err(|e| ExecutorError::Internal(e.to_string()))?
    }
}

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

const PAULI_X: Matrix2 = [[ZERO, ONE], [ONE, ZERO]];
const PAULI_Y: Matrix2 = [[ZERO, Complex64::new(0.0, -1.0)], [Complex64::new(0.0, 1.0), ZERO]];
const PAULI_Z: Matrix2 = [[ONE, ZERO], [ZERO, Complex64::new(-1.0, 0.0)]];

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn diagonal(phase: Complex64) -> Matrix2 {
    [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), phase]]
}

fn single_qubit_matrix(name: &str, angles: &[f64]) -> Option<Matrix2> {
    let zero = c(0.0, 0.0);
    let one = c(1.0, 0.0);

    let matrix = match (name, angles) {
        ("id", []) => [[one, zero], [zero, one]],
        ("x", []) => PAULI_X,
        ("y", []) => PAULI_Y,
        ("z", []) => PAULI_Z,
        ("h", []) => {
            let h = c(FRAC_1_SQRT_2, 0.0);
            [[h, h], [h, -h]]
        }
        ("s", []) => diagonal(c(0.0, 1.0)),
        ("sdg", []) => diagonal(c(0.0, -1.0)),
        ("t", []) => diagonal(Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4)),
        ("tdg", []) => diagonal(Complex64::from_polar(1.0, -std::f64::consts::FRAC_PI_4)),
        ("sx", []) => [[c(0.5, 0.5), c(0.5, -0.5)], [c(0.5, -0.5), c(0.5, 0.5)]],
        ("rx", [theta]) => {
            let (sin, cos) = (theta / 2.0).sin_cos();
            [[c(cos, 0.0), c(0.0, -sin)], [c(0.0, -sin), c(cos, 0.0)]]
        }
        ("ry", [theta]) => {
            let (sin, cos) = (theta / 2.0).sin_cos();
            [[c(cos, 0.0), c(-sin, 0.0)], [c(sin, 0.0), c(cos, 0.0)]]
        }
        ("rz", [theta]) => [
            [Complex64::from_polar(1.0, -theta / 2.0), zero],
            [zero, Complex64::from_polar(1.0, theta / 2.0)],
        ],
        ("p", [lambda]) => diagonal(Complex64::from_polar(1.0, *lambda)),
        ("u", [theta, phi, lambda]) => {
            let (sin, cos) = (theta / 2.0).sin_cos();
            [
                [c(cos, 0.0), -Complex64::from_polar(sin, *lambda)],
                [
                    Complex64::from_polar(sin, *phi),
                    Complex64::from_polar(cos, phi + lambda),
                ],
            ]
        }
        _ => return None,
    };

    Some(matrix)
}

/// Amplitudes of an n-qubit register; index bit `q` is qubit `q`
#[derive(Debug, Clone)]
struct Statevector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    fn zero(num_qubits: usize) -> Self {
        let mut amplitudes = vec![c(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = c(1.0, 0.0);
        Self {
            num_qubits,
            amplitudes,
        }
    }

    fn apply(
        &mut self,
        instruction: &Instruction,
        bindings: &Bindings,
        touched: &HashSet<usize>,
    ) -> Result<(), ExecutorError> {
        let angles = instruction
            .params
            .iter()
            .map(|p| p.resolve(bindings))
            .collect::<Result<Vec<f64>, String>>()
            .map_err(ExecutorError::InvalidGate)?;
        let qubits = instruction.qubits.as_slice();

        let distinct: HashSet<&usize> = qubits.iter().collect();
        if distinct.len() != qubits.len() {
            return Err(ExecutorError::InvalidGate(format!(
                "gate '{}' repeats a qubit in {:?}",
                instruction.name, qubits
            )));
        }

        let name = instruction.name.as_str();
        match (name, qubits) {
            ("measure" | "barrier", _) => Ok(()),
            ("reset", _) => {
                if qubits.iter().any(|q| touched.contains(q)) {
                    Err(ExecutorError::UnsupportedGate(
                        "reset after other gates".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
            ("cx", [control, target]) => {
                self.apply_controlled(*control, *target, &PAULI_X);
                Ok(())
            }
            ("cy", [control, target]) => {
                self.apply_controlled(*control, *target, &PAULI_Y);
                Ok(())
            }
            ("cz", [control, target]) => {
                self.apply_controlled(*control, *target, &PAULI_Z);
                Ok(())
            }
            ("swap", [a, b]) => {
                self.apply_swap(*a, *b);
                Ok(())
            }
            ("ccx", [c1, c2, target]) => {
                self.apply_toffoli(*c1, *c2, *target);
                Ok(())
            }
            (_, [qubit]) => match single_qubit_matrix(name, &angles) {
                Some(matrix) => {
                    self.apply_single(*qubit, &matrix);
                    Ok(())
                }
                None => Err(ExecutorError::UnsupportedGate(format!(
                    "{} with {} parameter(s)",
                    name,
                    angles.len()
                ))),
            },
            _ => Err(ExecutorError::UnsupportedGate(format!(
                "{} on {} qubit(s)",
                name,
                qubits.len()
            ))),
        }
    }

    fn apply_single(&mut self, qubit: usize, m: &Matrix2) {
        let bit = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & bit == 0 {
                let j = i | bit;
                let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_controlled(&mut self, control: usize, target: usize, m: &Matrix2) {
        let (cbit, tbit) = (1 << control, 1 << target);
        for i in 0..self.amplitudes.len() {
            if i & cbit != 0 && i & tbit == 0 {
                let j = i | tbit;
                let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, a: usize, b: usize) {
        let (abit, bbit) = (1 << a, 1 << b);
        for i in 0..self.amplitudes.len() {
            if i & abit != 0 && i & bbit == 0 {
                self.amplitudes.swap(i, i ^ abit ^ bbit);
            }
        }
    }

    fn apply_toffoli(&mut self, c1: usize, c2: usize, target: usize) {
        let controls = (1 << c1) | (1 << c2);
        let tbit = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & controls == controls && i & tbit == 0 {
                self.amplitudes.swap(i, i | tbit);
            }
        }
    }

    fn sample(&self, shots: u64, rng: &mut impl Rng) -> BTreeMap<String, u64> {
        let mut cumulative = Vec::with_capacity(self.amplitudes.len());
        let mut total = 0.0;
        for amplitude in &self.amplitudes {
            total += amplitude.norm_sqr();
            cumulative.push(total);
        }

        let last = cumulative.len() - 1;
        let mut counts = BTreeMap::new();
        for _ in 0..shots {
            let r = rng.r#gen::<f64>() * total;
            let index = cumulative.partition_point(|c| *c <= r).min(last);
            let bitstring = format!("{:0width$b}", index, width = self.num_qubits.max(1));
            *counts.entry(bitstring).or_insert(0) += 1;
        }
        counts
    }

    /// `<psi|P|psi>` for a little-endian Pauli label
    fn expectation(&self, label: &str) -> f64 {
        let mut flip_mask = 0usize;
        let mut z_mask = 0usize;
        let mut y_count = 0u32;

        for (qubit, pauli) in label.chars().rev().enumerate() {
            match pauli {
                'X' => flip_mask |= 1 << qubit,
                'Y' => {
                    flip_mask |= 1 << qubit;
                    z_mask |= 1 << qubit;
                    y_count += 1;
                }
                'Z' => z_mask |= 1 << qubit,
                _ => {}
            }
        }

        // Y = i * X * Z, so each Y contributes a global factor of i.
        let global = c(0.0, 1.0).powu(y_count);

        let value: Complex64 = self
            .amplitudes
            .iter()
            .enumerate()
            .map(|(i, amplitude)| {
                let sign = if (i & z_mask).count_ones() % 2 == 0 {
                    1.0
                } else {
                    -1.0
                };
                self.amplitudes[i ^ flip_mask].conj() * amplitude * sign
            })
            .sum();

        (global * value).re
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn executor() -> StatevectorExecutor {
        StatevectorExecutor::new(
            "aer",
            StatevectorConfig {
                default_shots: 200,
                seed: Some(7),
                max_qubits: 10,
            },
        )
    }

    fn bell() -> Value {
        json!({"num_qubits": 2, "gates": [
            {"name": "h", "qubits": [0]},
            {"name": "cx", "qubits": [0, 1]},
            {"name": "measure", "qubits": [0, 1]}
        ]})
    }

    #[tokio::test]
    async fn test_bell_counts_are_correlated() {
        let result = executor()
            .execute_sampler(vec![bell()], &JobOptions::new(), "fake_manila")
            .await
            .unwrap();

        let counts = result["pub_results"][0]["data"]["counts"]
            .as_object()
            .unwrap();
        let total: u64 = counts.values().map(|v| v.as_u64().unwrap()).sum();
        assert_eq!(total, 200);
        assert!(counts.keys().all(|k| k == "00" || k == "11"));
        assert_eq!(result["metadata"]["backend"], "fake_manila");
    }

    #[tokio::test]
    async fn test_default_shots_option_and_pub_override() {
        let mut options = JobOptions::new();
        options.insert("default_shots".to_string(), json!(50));

        let result = executor()
            .execute_sampler(vec![bell(), json!([bell(), null, 5])], &options, "fake_manila")
            .await
            .unwrap();

        assert_eq!(result["pub_results"][0]["metadata"]["shots"], 50);
        assert_eq!(result["pub_results"][1]["metadata"]["shots"], 5);
    }

    #[tokio::test]
    async fn test_x_gate_is_little_endian() {
        let circuit = json!({"num_qubits": 3, "gates": [{"name": "x", "qubits": [0]}]});
        let result = executor()
            .execute_sampler(vec![circuit], &JobOptions::new(), "fake_manila")
            .await
            .unwrap();

        assert_eq!(result["pub_results"][0]["data"]["counts"]["001"], 200);
    }

    #[tokio::test]
    async fn test_estimator_bell_expectations() {
        let unit = json!([bell(), ["ZZ", "XX", "ZI", {"YY": 2.0}], null, 0.01]);
        let result = executor()
            .execute_estimator(vec![unit], &JobOptions::new(), "fake_manila")
            .await
            .unwrap();

        let evs: Vec<f64> = result["pub_results"][0]["data"]["evs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();

        assert!((evs[0] - 1.0).abs() < 1e-9);
        assert!((evs[1] - 1.0).abs() < 1e-9);
        assert!(evs[2].abs() < 1e-9);
        assert!((evs[3] + 2.0).abs() < 1e-9);
        assert_eq!(result["pub_results"][0]["metadata"]["target_precision"], 0.01);
    }

    #[tokio::test]
    async fn test_parameter_binding() {
        let circuit = json!({"num_qubits": 1, "gates": [
            {"name": "ry", "qubits": [0], "params": ["theta"]}
        ]});
        let unit = json!([circuit, "Z", {"theta": std::f64::consts::PI}]);

        let result = executor()
            .execute_estimator(vec![unit], &JobOptions::new(), "fake_manila")
            .await
            .unwrap();
        let ev = result["pub_results"][0]["data"]["evs"][0].as_f64().unwrap();
        assert!((ev + 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unbound_parameter_fails() {
        let circuit = json!({"num_qubits": 1, "gates": [
            {"name": "rx", "qubits": [0], "params": ["phi"]}
        ]});
        let err = executor()
            .execute_sampler(vec![circuit], &JobOptions::new(), "fake_manila")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidGate(_)));
        assert!(err.to_string().contains("phi"));
    }

    #[tokio::test]
    async fn test_unsupported_gate_fails() {
        let circuit = json!({"num_qubits": 1, "gates": [{"name": "teleport", "qubits": [0]}]});
        let err = executor()
            .execute_sampler(vec![circuit], &JobOptions::new(), "fake_manila")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::UnsupportedGate(_)));
        assert!(err.to_string().contains("teleport"));
    }

    #[tokio::test]
    async fn test_circuit_too_large_fails() {
        let circuit = json!({"num_qubits": 11, "gates": []});
        let err = executor()
            .execute_sampler(vec![circuit], &JobOptions::new(), "fake_manila")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::TooManyQubits {
                requested: 11,
                limit: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_register_width_is_capped_regardless_of_config() {
        let wide = StatevectorExecutor::new(
            "aer",
            StatevectorConfig {
                max_qubits: 40,
                ..StatevectorConfig::default()
            },
        );
        let circuit = json!({"num_qubits": 40, "gates": []});

        let err = wide
            .execute_sampler(vec![circuit], &JobOptions::new(), "statevector_simulator")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::TooManyQubits {
                requested: 40,
                limit: MAX_SUPPORTED_QUBITS
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_work_unit_carries_its_index() {
        let err = executor()
            .execute_sampler(
                vec![bell(), json!("not a circuit")],
                &JobOptions::new(),
                "fake_manila",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidWorkUnit { index: 1, .. }));
    }

    #[test]
    fn test_controlled_paulis() {
        let mut state = Statevector::zero(2);
        state.apply_single(0, &PAULI_X);
        state.apply_controlled(0, 1, &PAULI_Y);
        assert!((state.amplitudes[0b11].im - 1.0).abs() < 1e-12);

        state.apply_controlled(0, 1, &PAULI_Z);
        assert!((state.amplitudes[0b11].im + 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_invalid_default_shots_option() {
        let mut options = JobOptions::new();
        options.insert("default_shots".to_string(), json!("many"));

        let err = executor()
            .execute_sampler(vec![bell()], &options, "fake_manila")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidOption(_)));
    }

    #[test]
    fn test_swap_and_toffoli() {
        let mut state = Statevector::zero(3);
        state.apply_single(0, &PAULI_X);
        state.apply_single(1, &PAULI_X);
        state.apply_toffoli(0, 1, 2);
        assert!((state.amplitudes[0b111].re - 1.0).abs() < 1e-12);

        state.apply_single(0, &PAULI_X);
        state.apply_swap(0, 2);
        assert!((state.amplitudes[0b011].re - 1.0).abs() < 1e-12);
    }
}
