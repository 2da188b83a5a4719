//! A [`Subsystem`] is a view onto a [`crate::network::Network`]: a subset of
//! nodes, frozen at a particular state, with everything outside the subset
//! conditioned away as a boundary condition and an optional cut severing
//! some of its internal connectivity.
//!
//! Grounded on `pyphi/subsystem.py`.

use crate::cut::Cut;
use crate::distribution::{broadcast_mul, condition, max_entropy_distribution, normalize};
use crate::error::{IITError, Result};
use crate::network::Network;
use crate::node::{generate_nodes, Node};
use ndarray::ArrayD;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Which repertoire to compute: a mechanism's past-facing or future-facing
/// distribution. A tagged enum rather than a trait, per spec.md §9 — the
/// set of directions is fixed and small, and both arms need to thread
/// through the same cache key shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Cause,
    Effect,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Cause => Direction::Effect,
            Direction::Effect => Direction::Cause,
        }
    }
}

type RepertoireKey = (Direction, Vec<usize>, Vec<usize>);

#[derive(Default)]
struct Caches {
    repertoire: HashMap<RepertoireKey, ArrayD<f64>>,
}

pub struct Subsystem {
    pub network: Arc<Network>,
    pub state: Vec<usize>,
    pub indices: Vec<usize>,
    pub external_indices: Vec<usize>,
    pub cut: Cut,
    pub tpm: ArrayD<f64>,
    pub cm: Vec<Vec<bool>>,
    nodes: Vec<Node>,
    caches: Mutex<Caches>,
}

impl Subsystem {
    /// Build the subsystem of `network` consisting of `indices` at `state`
    /// (the full network state vector), with `cut` applied to its
    /// connectivity.
    pub fn new(network: Arc<Network>, state: Vec<usize>, mut indices: Vec<usize>, cut: Cut) -> Result<Self> {
        let n = network.n;
        if state.len() != n {
            return Err(IITError::Validation(format!(
                "state length must match network size: expected {n}, got {}",
                state.len()
            )));
        }
        if let Some(&bad) = state.iter().find(|&&s| s != 0 && s != 1) {
            return Err(IITError::Validation(format!("state entries must be 0 or 1, got {bad}")));
        }
        if indices.is_empty() {
            return Err(IITError::Validation("subsystem must have at least one node index".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(IITError::Validation(format!(
                "node index {bad} is out of range for a network of {n} nodes"
            )));
        }

        indices.sort_unstable();
        indices.dedup();
        let external_indices: Vec<usize> = (0..n).filter(|i| !indices.contains(i)).collect();

        let ext_values: Vec<usize> = external_indices.iter().map(|&i| state[i]).collect();
        let tpm = condition(&network.tpm, &external_indices, &ext_values);
        let cm = cut.apply(&network.cm);

        let nodes = generate_nodes(&tpm, &cm, &state, &indices);

        Ok(Subsystem {
            network,
            state,
            indices,
            external_indices,
            cut,
            tpm,
            cm,
            nodes,
            caches: Mutex::new(Caches::default()),
        })
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }

    pub fn node(&self, index: usize) -> &Node {
        self.nodes
            .iter()
            .find(|n| n.index == index)
            .expect("index must belong to this subsystem")
    }

    /// The cause repertoire of `mechanism` over `purview`: the distribution
    /// over `purview`'s past states implied by `mechanism` currently being
    /// in its actual state, assuming a maximum-entropy (uniform) prior.
    ///
    /// Empty mechanism gives the unconstrained (maximum-entropy) repertoire.
    pub fn cause_repertoire(&self, mechanism: &[usize], purview: &[usize]) -> ArrayD<f64> {
        if let Some(hit) = self.cache_get(Direction::Cause, mechanism, purview) {
            return hit;
        }
        let result = if mechanism.is_empty() {
            max_entropy_distribution(purview, self.network.n)
        } else {
            let mut repertoire = max_entropy_distribution(purview, self.network.n);
            for &m in mechanism {
                let node = self.node(m);
                let observed = if node.state == 1 { node.tpm_on() } else { node.tpm_off() };
                let extra: Vec<usize> = node.inputs.iter().copied().filter(|i| !purview.contains(i)).collect();
                let factor = crate::distribution::marginalize_out(&extra, &observed);
                repertoire = broadcast_mul(&repertoire, &factor);
            }
            normalize(repertoire).unwrap_or_else(|_| max_entropy_distribution(purview, self.network.n))
        };
        self.cache_put(Direction::Cause, mechanism, purview, result.clone());
        result
    }

    /// The effect repertoire of `mechanism` over `purview`: the distribution
    /// over `purview`'s next states caused by `mechanism` being in its
    /// actual state, with every other (non-mechanism) input to each purview
    /// node marginalized out rather than fixed — `pyphi/subsystem.py`
    /// conditions on the mechanism's state then averages over the rest.
    pub fn effect_repertoire(&self, mechanism: &[usize], purview: &[usize]) -> ArrayD<f64> {
        if let Some(hit) = self.cache_get(Direction::Effect, mechanism, purview) {
            return hit;
        }
        let tpm_size = self.network.n;
        let mut repertoire = ndarray::Array::from_elem(ndarray::IxDyn(&vec![1; tpm_size]), 1.0f64);

        for &p in purview {
            let node = self.node(p);
            let mech_inputs: Vec<usize> = node.inputs.iter().copied().filter(|i| mechanism.contains(i)).collect();
            let mech_values: Vec<usize> = mech_inputs.iter().map(|&i| self.state[i]).collect();
            let other_inputs: Vec<usize> = node.inputs.iter().copied().filter(|i| !mechanism.contains(i)).collect();

            let mut tpm_on = node.tpm_on();
            tpm_on = condition(&tpm_on, &mech_inputs, &mech_values);
            tpm_on = crate::distribution::marginalize_out(&other_inputs, &tpm_on);
            let p_on = *tpm_on.iter().next().unwrap_or(&0.0);

            let mut factor_shape = vec![1usize; tpm_size];
            factor_shape[p] = 2;
            let mut factor = ndarray::Array::zeros(ndarray::IxDyn(&factor_shape));
            let mut off_idx = vec![0usize; tpm_size];
            off_idx[p] = 0;
            let mut on_idx = vec![0usize; tpm_size];
            on_idx[p] = 1;
            factor[off_idx.as_slice()] = 1.0 - p_on;
            factor[on_idx.as_slice()] = p_on;

            repertoire = broadcast_mul(&repertoire, &factor);
        }
        let result = normalize(repertoire).unwrap_or_else(|_| max_entropy_distribution(purview, tpm_size));
        self.cache_put(Direction::Effect, mechanism, purview, result.clone());
        result
    }

    pub fn repertoire(&self, direction: Direction, mechanism: &[usize], purview: &[usize]) -> ArrayD<f64> {
        match direction {
            Direction::Cause => self.cause_repertoire(mechanism, purview),
            Direction::Effect => self.effect_repertoire(mechanism, purview),
        }
    }

    /// Broadcast `repertoire` (defined over `purview`) to a distribution
    /// over this subsystem's full node set, by multiplying in the
    /// unconstrained repertoire over the nodes missing from `purview`.
    pub fn expand_repertoire(&self, repertoire: &ArrayD<f64>, purview: &[usize]) -> ArrayD<f64> {
        let missing: Vec<usize> = self.indices.iter().copied().filter(|i| !purview.contains(i)).collect();
        let unconstrained = max_entropy_distribution(&missing, self.network.n);
        let expanded = broadcast_mul(repertoire, &unconstrained);
        normalize(expanded).unwrap_or_else(|_| repertoire.clone())
    }

    /// The unconstrained (maximum-entropy) repertoire over this subsystem's
    /// whole node set, for `direction`. This is the origin of concept space
    /// and the comparison point for a mechanism's "information".
    pub fn unconstrained_repertoire(&self, direction: Direction) -> ArrayD<f64> {
        self.repertoire(direction, &[], &self.indices)
    }

    fn cache_get(&self, direction: Direction, mechanism: &[usize], purview: &[usize]) -> Option<ArrayD<f64>> {
        let key = (direction, mechanism.to_vec(), purview.to_vec());
        self.caches.lock().unwrap().repertoire.get(&key).cloned()
    }

    fn cache_put(&self, direction: Direction, mechanism: &[usize], purview: &[usize], value: ArrayD<f64>) {
        let key = (direction, mechanism.to_vec(), purview.to_vec());
        self.caches.lock().unwrap().repertoire.insert(key, value);
    }
}

/// Whether the subsystem's own nodes form a single strongly connected
/// component under its (possibly cut) connectivity matrix. A subsystem
/// that isn't strongly connected is reducible: some partition severs it
/// with zero integrated information, so the cut search can be skipped.
///
/// Tarjan's algorithm, dependency-free (no graph crate in the corpus).
pub fn is_strongly_connected(cm: &[Vec<bool>], indices: &[usize]) -> bool {
    if indices.len() <= 1 {
        return true;
    }
    let n = indices.len();
    let pos: HashMap<usize, usize> = indices.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    let mut index_counter = 0usize;
    let mut stack = Vec::new();
    let mut on_stack = vec![false; n];
    let mut indices_arr = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut num_components = 0usize;

    fn strongconnect(
        v: usize,
        cm: &[Vec<bool>],
        indices: &[usize],
        pos: &HashMap<usize, usize>,
        index_counter: &mut usize,
        stack: &mut Vec<usize>,
        on_stack: &mut Vec<bool>,
        indices_arr: &mut Vec<Option<usize>>,
        lowlink: &mut [usize],
        num_components: &mut usize,
    ) {
        indices_arr[v] = Some(*index_counter);
        lowlink[v] = *index_counter;
        *index_counter += 1;
        stack.push(v);
        on_stack[v] = true;

        for (w, &global_w) in indices.iter().enumerate() {
            if !cm[indices[v]][global_w] {
                continue;
            }
            let w = pos[&global_w];
            if indices_arr[w].is_none() {
                strongconnect(w, cm, indices, pos, index_counter, stack, on_stack, indices_arr, lowlink, num_components);
                lowlink[v] = lowlink[v].min(lowlink[w]);
            } else if on_stack[w] {
                lowlink[v] = lowlink[v].min(indices_arr[w].unwrap());
            }
        }

        if lowlink[v] == indices_arr[v].unwrap() {
            *num_components += 1;
            while let Some(w) = stack.pop() {
                on_stack[w] = false;
                if w == v {
                    break;
                }
            }
        }
    }

    for v in 0..n {
        if indices_arr[v].is_none() {
            strongconnect(
                v,
                cm,
                indices,
                &pos,
                &mut index_counter,
                &mut stack,
                &mut on_stack,
                &mut indices_arr,
                &mut lowlink,
                &mut num_components,
            );
        }
    }
    num_components == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use ndarray::array;

    fn two_node_or_network() -> Arc<Network> {
        // OR gate: both nodes are ORs of each other.
        let sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let cm = vec![vec![true, true], vec![true, true]];
        Arc::new(Network::from_state_by_state(sbs, cm, None).unwrap())
    }

    #[test]
    fn cause_repertoire_of_empty_mechanism_is_uniform() {
        let net = two_node_or_network();
        let sub = Subsystem::new(net.clone(), vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let r = sub.cause_repertoire(&[], &[0, 1]);
        let sum: f64 = r.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for &p in r.iter() {
            assert!((p - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn strongly_connected_pair_detected() {
        let cm = vec![vec![true, true], vec![true, true]];
        assert!(is_strongly_connected(&cm, &[0, 1]));
    }

    #[test]
    fn disconnected_pair_not_strongly_connected() {
        let cm = vec![vec![true, false], vec![false, true]];
        assert!(!is_strongly_connected(&cm, &[0, 1]));
    }

    #[test]
    fn rejects_wrong_length_state() {
        let net = two_node_or_network();
        assert!(Subsystem::new(net, vec![1, 1, 1], vec![0, 1], Cut::Null).is_err());
    }

    #[test]
    fn rejects_non_binary_state() {
        let net = two_node_or_network();
        assert!(Subsystem::new(net, vec![2, 0], vec![0, 1], Cut::Null).is_err());
    }

    #[test]
    fn rejects_out_of_range_index() {
        let net = two_node_or_network();
        assert!(Subsystem::new(net, vec![1, 1], vec![0, 5], Cut::Null).is_err());
    }

    #[test]
    fn rejects_empty_index_set() {
        let net = two_node_or_network();
        assert!(Subsystem::new(net, vec![1, 1], vec![], Cut::Null).is_err());
    }
}
