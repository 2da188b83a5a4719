//! Per-node transition probability slices within a subsystem.
//!
//! Grounded on `pyphi/node.py`: a node's TPM is the subsystem TPM's column
//! for that node, marginalized over everything that isn't one of its inputs,
//! stacked into an off/on pair along a trailing axis.

use crate::distribution::marginalize_out;
use ndarray::{ArrayD, Axis};

/// One node of a subsystem: its inputs/outputs (restricted to the
/// subsystem's own connectivity matrix, post-cut) and its conditional TPM.
#[derive(Debug, Clone)]
pub struct Node {
    pub index: usize,
    pub state: usize,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
    /// Shape `[2; tpm_size]` followed by a trailing axis of length 2:
    /// `tpm[.., 0]` is the probability this node is OFF, `tpm[.., 1]` ON,
    /// given the state of the rest of the subsystem.
    pub tpm: ArrayD<f64>,
}

impl Node {
    pub fn tpm_on(&self) -> ArrayD<f64> {
        self.tpm.index_axis(Axis(self.tpm.ndim() - 1), 1).to_owned()
    }

    pub fn tpm_off(&self) -> ArrayD<f64> {
        self.tpm.index_axis(Axis(self.tpm.ndim() - 1), 0).to_owned()
    }
}

/// Indices of nodes with an edge into `index` (`cm[j][index]`).
pub fn inputs_from_cm(index: usize, cm: &[Vec<bool>]) -> Vec<usize> {
    (0..cm.len()).filter(|&j| cm[j][index]).collect()
}

/// Indices of nodes with an edge out of `index` (`cm[index][j]`).
pub fn outputs_from_cm(index: usize, cm: &[Vec<bool>]) -> Vec<usize> {
    (0..cm.len()).filter(|&j| cm[index][j]).collect()
}

/// Build [`Node`]s for every index in `indices`, given the subsystem's
/// (already conditioned and cut-applied) state-by-node TPM and connectivity
/// matrix, and the full network's current state.
pub fn generate_nodes(tpm: &ArrayD<f64>, cm: &[Vec<bool>], network_state: &[usize], indices: &[usize]) -> Vec<Node> {
    let n = cm.len();
    indices
        .iter()
        .map(|&index| {
            let inputs = inputs_from_cm(index, cm);
            let outputs = outputs_from_cm(index, cm);

            let tpm_on = tpm.index_axis(Axis(n), index).to_owned();
            let non_inputs: Vec<usize> = (0..n).filter(|i| !inputs.contains(i)).collect();
            let tpm_on = marginalize_out(&non_inputs, &tpm_on);
            let tpm_off = tpm_on.mapv(|p| 1.0 - p);

            let node_tpm = ndarray::stack(Axis(n), &[tpm_off.view(), tpm_on.view()])
                .expect("off/on TPM halves have matching shape by construction");

            Node {
                index,
                state: network_state[index],
                inputs,
                outputs,
                tpm: node_tpm,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn copy_gate_node_tpm() {
        // Single node, self-loop, identity dynamics.
        let mut tpm = ndarray::Array::zeros(IxDyn(&[2, 1]));
        tpm[[1, 0]] = 1.0;
        let cm = vec![vec![true]];
        let nodes = generate_nodes(&tpm, &cm, &[0], &[0]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].inputs, vec![0]);
        let on = nodes[0].tpm_on();
        assert!((on[[0]] - 0.0).abs() < 1e-9);
        assert!((on[[1]] - 1.0).abs() < 1e-9);
    }
}
