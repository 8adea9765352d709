//! Work-unit parsing for the statevector executor
//!
//! Circuits arrive as `{"num_qubits": n, "gates": [...]}`; sampler and
//! estimator work units wrap them in positional arrays.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Parameter name to value bindings for one work unit
pub type Bindings = HashMap<String, f64>;

/// A gate parameter: a literal angle or a named parameter bound per work unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Value(f64),
    Symbol(String),
}

impl Param {
    pub fn resolve(&self, bindings: &Bindings) -> Result<f64, String> {
        match self {
            Param::Value(v) => Ok(*v),
            Param::Symbol(name) => bindings
                .get(name)
                .copied()
                .ok_or_else(|| format!("parameter '{}' is not bound", name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Instruction {
    pub name: String,
    pub qubits: Vec<usize>,
    #[serde(default)]
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Circuit {
    pub num_qubits: usize,
    #[serde(default)]
    pub gates: Vec<Instruction>,
}

/// Weighted sum of Pauli strings, e.g. `{"ZZ": 1.0, "XI": -0.5}`
#[derive(Debug, Clone, PartialEq)]
pub struct Observable {
    pub terms: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerPub {
    pub circuit: Circuit,
    pub bindings: Bindings,
    pub shots: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorPub {
    pub circuit: Circuit,
    pub observables: Vec<Observable>,
    pub bindings: Bindings,
    pub precision: Option<f64>,
}

/// Parses `circuit | [circuit] | [circuit, values] | [circuit, values, shots]`
pub fn parse_sampler_pub(unit: &Value) -> Result<SamplerPub, String> {
    let items: Vec<&Value> = match unit {
        Value::Array(items) => items.iter().collect(),
        object @ Value::Object(_) => vec![object],
        other => return Err(format!("expected a circuit or an array, found {}", other)),
    };

    if items.is_empty() || items.len() > 3 {
        return Err(format!("expected 1 to 3 elements, found {}", items.len()));
    }

    let circuit = parse_circuit(items[0])?;
    let bindings = match items.get(1) {
        Some(values) => parse_bindings(values)?,
        None => Bindings::new(),
    };
    let shots = match items.get(2) {
        Some(Value::Null) | None => None,
        Some(value) => Some(
            value
                .as_u64()
                .filter(|s| *s > 0)
                .ok_or_else(|| format!("shots must be a positive integer, found {}", value))?,
        ),
    };

    Ok(SamplerPub {
        circuit,
        bindings,
        shots,
    })
}

/// Parses `[circuit, observables, values?, precision?]`
pub fn parse_estimator_pub(unit: &Value) -> Result<EstimatorPub, String> {
    let items = unit
        .as_array()
        .ok_or_else(|| format!("expected an array, found {}", unit))?;

    if items.len() < 2 || items.len() > 4 {
        return Err(format!("expected 2 to 4 elements, found {}", items.len()));
    }

    let circuit = parse_circuit(&items[0])?;
    let observables = parse_observables(&items[1], circuit.num_qubits)?;
    let bindings = match items.get(2) {
        Some(values) => parse_bindings(values)?,
        None => Bindings::new(),
    };
    let precision = match items.get(3) {
        Some(Value::Null) | None => None,
        Some(value) => Some(
            value
                .as_f64()
                .filter(|p| *p >= 0.0)
                .ok_or_else(|| format!("precision must be a non-negative number, found {}", value))?,
        ),
    };

    Ok(EstimatorPub {
        circuit,
        observables,
        bindings,
        precision,
    })
}

fn parse_circuit(value: &Value) -> Result<Circuit, String> {
    let circuit: Circuit =
        serde_json::from_value(value.clone()).map_err(|e| format!("malformed circuit: {}", e))?;

    for instruction in &circuit.gates {
        if let Some(q) = instruction
            .qubits
            .iter()
            .find(|q| **q >= circuit.num_qubits)
        {
            return Err(format!(
                "gate '{}' targets qubit {} of a {}-qubit circuit",
                instruction.name, q, circuit.num_qubits
            ));
        }
    }

    Ok(circuit)
}

fn parse_bindings(value: &Value) -> Result<Bindings, String> {
    match value {
        Value::Null => Ok(Bindings::new()),
        Value::Object(map) => map
            .iter()
            .map(|(name, v)| {
                v.as_f64()
                    .map(|f| (name.clone(), f))
                    .ok_or_else(|| format!("parameter '{}' must be a number", name))
            })
            .collect(),
        other => Err(format!("parameter values must be an object, found {}", other)),
    }
}

fn parse_observables(value: &Value, num_qubits: usize) -> Result<Vec<Observable>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| parse_observable(item, num_qubits))
            .collect(),
        single => Ok(vec![parse_observable(single, num_qubits)?]),
    }
}

fn parse_observable(value: &Value, num_qubits: usize) -> Result<Observable, String> {
    let terms = match value {
        Value::String(label) => vec![(label.clone(), 1.0)],
        Value::Object(map) => map
            .iter()
            .map(|(label, coeff)| {
                coeff
                    .as_f64()
                    .map(|c| (label.clone(), c))
                    .ok_or_else(|| format!("coefficient of '{}' must be a number", label))
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(format!("unsupported observable: {}", other)),
    };

    for (label, _) in &terms {
        if label.len() != num_qubits {
            return Err(format!(
                "observable '{}' has length {} but the circuit has {} qubits",
                label,
                label.len(),
                num_qubits
            ));
        }
        if !label.chars().all(|c| matches!(c, 'I' | 'X' | 'Y' | 'Z')) {
            return Err(format!("observable '{}' is not a Pauli string", label));
        }
    }

    Ok(Observable { terms })
}
