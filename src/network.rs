//! The immutable substrate a [`crate::subsystem::Subsystem`] is carved out
//! of: a transition probability matrix and a connectivity matrix over a
//! fixed set of binary nodes.
//!
//! Grounded on the teacher crate's `Network`/TPM handling conventions and
//! `pyphi`'s `Network`/`tpm.py` (state-by-node as the canonical in-memory
//! form, with state-by-state accepted at the boundary).

use crate::combinatorics::state_from_index;
use crate::error::{IITError, Result};
use ndarray::{Array2, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// A network of `n` binary nodes: a transition probability matrix in
/// state-by-node form (shape `[2; n]` followed by a trailing axis of length
/// `n`, so `tpm[s0, s1, ..., s_{n-1}, i]` is `P(node i = ON at t+1 | state s
/// at t)`), and a directed connectivity matrix `cm[i][j]` meaning "node i
/// influences node j".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub n: usize,
    pub tpm: ArrayD<f64>,
    pub cm: Vec<Vec<bool>>,
    pub node_labels: Vec<String>,
}

impl Network {
    /// Build a network from a state-by-node TPM and connectivity matrix.
    pub fn new(tpm: ArrayD<f64>, cm: Vec<Vec<bool>>, node_labels: Option<Vec<String>>) -> Result<Self> {
        let n = cm.len();
        validate_cm(&cm)?;
        validate_sbn_tpm(&tpm, n)?;
        let node_labels = node_labels.unwrap_or_else(|| default_labels(n));
        if node_labels.len() != n {
            return Err(IITError::Validation(format!(
                "expected {} node labels, got {}",
                n,
                node_labels.len()
            )));
        }
        Ok(Network { n, tpm, cm, node_labels })
    }

    /// Build a network from a state-by-state TPM (`2^n x 2^n`, row `s`
    /// giving `P(next = s' | current = s)`), converting to the canonical
    /// state-by-node form.
    pub fn from_state_by_state(sbs: Array2<f64>, cm: Vec<Vec<bool>>, node_labels: Option<Vec<String>>) -> Result<Self> {
        let n = cm.len();
        let dim = 1usize << n;
        if sbs.shape() != [dim, dim] {
            return Err(IITError::Validation(format!(
                "state-by-state TPM must be {dim}x{dim} for {n} nodes, got {:?}",
                sbs.shape()
            )));
        }
        let sbn = sbs_to_sbn(&sbs, n)?;
        Self::new(sbn, cm, node_labels)
    }

    pub fn label(&self, index: usize) -> &str {
        &self.node_labels[index]
    }
}

fn validate_cm(cm: &[Vec<bool>]) -> Result<()> {
    let n = cm.len();
    if n == 0 {
        return Err(IITError::Validation("connectivity matrix must have at least one node".into()));
    }
    for (i, row) in cm.iter().enumerate() {
        if row.len() != n {
            return Err(IITError::Validation(format!(
                "connectivity matrix row {i} has length {}, expected {n} (matrix must be square)",
                row.len()
            )));
        }
    }
    Ok(())
}

fn validate_sbn_tpm(tpm: &ArrayD<f64>, n: usize) -> Result<()> {
    let expected: Vec<usize> = std::iter::repeat(2).take(n).chain(std::iter::once(n)).collect();
    if tpm.shape() != expected.as_slice() {
        return Err(IITError::Validation(format!(
            "state-by-node TPM shape mismatch: expected {:?}, got {:?}",
            expected,
            tpm.shape()
        )));
    }
    for &p in tpm.iter() {
        if !(0.0..=1.0).contains(&p) {
            return Err(IITError::Validation(format!("TPM entry {p} is outside [0, 1]")));
        }
    }
    Ok(())
}

fn default_labels(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let c = (b'A' + (i % 26) as u8) as char;
            if i < 26 {
                c.to_string()
            } else {
                format!("{c}{}", i / 26)
            }
        })
        .collect()
}

/// Convert a state-by-state TPM into state-by-node form, assuming nodes are
/// conditionally independent given the current state (the standard
/// factored-TPM assumption): `sbn[s, i] = sum over s' with s'_i = 1 of
/// sbs[s, s']`.
fn sbs_to_sbn(sbs: &Array2<f64>, n: usize) -> Result<ArrayD<f64>> {
    let dim = 1usize << n;
    let shape: Vec<usize> = std::iter::repeat(2).take(n).chain(std::iter::once(n)).collect();
    let mut sbn = ndarray::Array::zeros(IxDyn(&shape));
    for s_idx in 0..dim {
        let row_sum: f64 = sbs.row(s_idx).sum();
        if (row_sum - 1.0).abs() > 1e-6 {
            return Err(IITError::Validation(format!(
                "state-by-state TPM row {s_idx} sums to {row_sum}, expected 1.0"
            )));
        }
        let s_state = state_from_index(s_idx, n);
        for i in 0..n {
            let mut on_mass = 0.0;
            for sp_idx in 0..dim {
                let sp_state = state_from_index(sp_idx, n);
                if sp_state[i] == 1 {
                    on_mass += sbs[(s_idx, sp_idx)];
                }
            }
            let mut idx = s_state.clone();
            idx.push(i);
            sbn[idx.as_slice()] = on_mass;
        }
    }
    Ok(sbn)
}

/// Convert a state-by-node TPM into its equivalent state-by-state TPM under
/// the factored-TPM assumption: `sbs[s, s'] = product over i of
/// (sbn[s, i] if s'_i = 1 else 1 - sbn[s, i])`.
pub fn sbn_to_sbs(tpm: &ArrayD<f64>, n: usize) -> Array2<f64> {
    let dim = 1usize << n;
    let mut sbs = Array2::<f64>::zeros((dim, dim));
    for s_idx in 0..dim {
        let s_state = state_from_index(s_idx, n);
        for sp_idx in 0..dim {
            let sp_state = state_from_index(sp_idx, n);
            let mut p = 1.0;
            for i in 0..n {
                let mut idx = s_state.clone();
                idx.push(i);
                let on_prob = tpm[idx.as_slice()];
                p *= if sp_state[i] == 1 { on_prob } else { 1.0 - on_prob };
            }
            sbs[(s_idx, sp_idx)] = p;
        }
    }
    sbs
}

/// The connectivity matrix as a dense `n x n` array of 0.0/1.0, for callers
/// that want matrix operations over it instead of `Vec<Vec<bool>>` indexing.
pub fn cm_as_dense(cm: &[Vec<bool>]) -> Array2<f64> {
    let n = cm.len();
    Array2::from_shape_fn((n, n), |(i, j)| if cm[i][j] { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn copy_tpm() -> ArrayD<f64> {
        // 1-node identity: next state equals current state.
        let mut t = ndarray::Array::zeros(IxDyn(&[2, 1]));
        t[[0, 0]] = 0.0;
        t[[1, 0]] = 1.0;
        t
    }

    #[test]
    fn builds_single_node_network() {
        let net = Network::new(copy_tpm(), vec![vec![true]], None).unwrap();
        assert_eq!(net.n, 1);
        assert_eq!(net.label(0), "A");
    }

    #[test]
    fn rejects_non_square_cm() {
        let err = Network::new(copy_tpm(), vec![vec![true, false]], None);
        assert!(err.is_err());
    }

    #[test]
    fn sbs_roundtrip_for_copy_gate() {
        let sbs = array![[1.0, 0.0], [0.0, 1.0]];
        let net = Network::from_state_by_state(sbs.clone(), vec![vec![true]], None).unwrap();
        let back = sbn_to_sbs(&net.tpm, 1);
        assert!((back[(0, 0)] - 1.0).abs() < 1e-9);
        assert!((back[(1, 1)] - 1.0).abs() < 1e-9);
    }
}
