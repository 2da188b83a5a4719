//! `MarblSet`: a canonical Markov-blanket fingerprint used as the key into
//! the persistent concept cache.
//!
//! Grounded on `cyphi/compute.py`'s use of `MarblSet` as the cache key for
//! `concept()`: a mechanism's contribution to Φ depends only on its Markov
//! blanket (itself, its inputs, its outputs) and the state and cut
//! restricted to that blanket — not on the rest of the subsystem. Caching
//! on the blanket rather than the whole subsystem lets concepts computed in
//! one subsystem be reused when an unrelated part of the network changes.

use crate::cut::Cut;
use crate::subsystem::Subsystem;
use std::collections::BTreeSet;

/// A mechanism's Markov blanket, its state, the part of the cut that
/// touches it, and each blanket node's TPM slice, in a form suitable as a
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarblSet {
    mechanism: Vec<usize>,
    blanket: Vec<usize>,
    blanket_state: Vec<usize>,
    cut_signature: Vec<(usize, usize)>,
    node_tpm_signature: Vec<String>,
}

impl MarblSet {
    /// The mechanism's blanket: itself plus every node it reads from or
    /// writes to in `subsystem`'s (already cut) connectivity matrix.
    fn blanket_of(subsystem: &Subsystem, mechanism: &[usize]) -> Vec<usize> {
        let mut blanket: BTreeSet<usize> = mechanism.iter().copied().collect();
        for &m in mechanism {
            let node = subsystem.node(m);
            blanket.extend(node.inputs.iter().copied());
            blanket.extend(node.outputs.iter().copied());
        }
        blanket.into_iter().collect()
    }

    /// A fixed-precision serialization of each `blanket` node's conditional
    /// TPM slice (its `tpm_on`), in `blanket` order. Two networks that share
    /// connectivity, indices, and state but differ in dynamics (an AND gate
    /// vs. an OR gate on the same wiring) must not collide in the persistent
    /// cache — the TPM slice is exactly the input this key was missing.
    fn node_tpm_signature(subsystem: &Subsystem, blanket: &[usize]) -> Vec<String> {
        blanket
            .iter()
            .map(|&b| {
                let tpm_on = subsystem.node(b).tpm_on();
                tpm_on.iter().map(|p| format!("{:.12}", p)).collect::<Vec<_>>().join(",")
            })
            .collect()
    }

    /// The cut's severed edges restricted to `blanket`, as raw, as-given
    /// pairs — not sorted or deduplicated beyond what [`Cut::apply`]
    /// already guarantees. This is the "unnormalized" key `cyphi` tries
    /// first.
    fn raw_cut_signature(cut: &Cut, blanket: &[usize]) -> Vec<(usize, usize)> {
        match cut {
            Cut::Null => Vec::new(),
            Cut::Directed { from, to } => from
                .iter()
                .flat_map(|&i| to.iter().map(move |&j| (i, j)))
                .filter(|(i, j)| blanket.contains(i) && blanket.contains(j))
                .collect(),
            Cut::K { parts, severed } => severed
                .iter()
                .flat_map(|&(pi, pj)| parts[pi].iter().flat_map(move |&i| parts[pj].iter().map(move |&j| (i, j))))
                .filter(|(i, j)| blanket.contains(i) && blanket.contains(j))
                .collect(),
        }
    }

    /// The same severed-edge set, canonicalized by sorting, used as the
    /// fallback key so that logically-identical cuts expressed through
    /// different `Cut` shapes still hit the same cache entry.
    fn canonical_cut_signature(cut: &Cut, blanket: &[usize]) -> Vec<(usize, usize)> {
        let mut sig = Self::raw_cut_signature(cut, blanket);
        sig.sort_unstable();
        sig.dedup();
        sig
    }

    /// Build the "raw" (unnormalized) key for `mechanism` in `subsystem`.
    pub fn raw(subsystem: &Subsystem, mechanism: &[usize]) -> Self {
        let blanket = Self::blanket_of(subsystem, mechanism);
        let blanket_state = blanket.iter().map(|&i| subsystem.state[i]).collect();
        let cut_signature = Self::raw_cut_signature(&subsystem.cut, &blanket);
        let node_tpm_signature = Self::node_tpm_signature(subsystem, &blanket);
        MarblSet {
            mechanism: mechanism.to_vec(),
            blanket,
            blanket_state,
            cut_signature,
            node_tpm_signature,
        }
    }

    /// Build the canonical key for `mechanism` in `subsystem`.
    pub fn canonical(subsystem: &Subsystem, mechanism: &[usize]) -> Self {
        let blanket = Self::blanket_of(subsystem, mechanism);
        let blanket_state = blanket.iter().map(|&i| subsystem.state[i]).collect();
        let cut_signature = Self::canonical_cut_signature(&subsystem.cut, &blanket);
        let node_tpm_signature = Self::node_tpm_signature(subsystem, &blanket);
        MarblSet {
            mechanism: mechanism.to_vec(),
            blanket,
            blanket_state,
            cut_signature,
            node_tpm_signature,
        }
    }

    /// A filesystem- and `HashMap`-safe content-address for this key.
    pub fn content_key(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.node_tpm_signature.hash(&mut hasher);
        let tpm_digest = hasher.finish();

        format!(
            "m{}_b{}_s{}_c{}_t{:x}",
            self.mechanism.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("-"),
            self.blanket.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("-"),
            self.blanket_state.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(""),
            self.cut_signature
                .iter()
                .map(|(i, j)| format!("{i}>{j}"))
                .collect::<Vec<_>>()
                .join("-"),
            tpm_digest,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use ndarray::array;
    use std::sync::Arc;

    #[test]
    fn null_cut_gives_same_raw_and_canonical_key() {
        let sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let cm = vec![vec![true, true], vec![true, true]];
        let net = Arc::new(Network::from_state_by_state(sbs, cm, None).unwrap());
        let sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let raw = MarblSet::raw(&sub, &[0]);
        let canon = MarblSet::canonical(&sub, &[0]);
        assert_eq!(raw.content_key(), canon.content_key());
    }

    #[test]
    fn key_is_deterministic_for_the_same_subsystem_and_mechanism() {
        let sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let cm = vec![vec![true, true], vec![true, true]];
        let net = Arc::new(Network::from_state_by_state(sbs, cm, None).unwrap());
        let sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let a = MarblSet::canonical(&sub, &[0]);
        let b = MarblSet::canonical(&sub, &[0]);
        assert_eq!(a.content_key(), b.content_key());
    }

    #[test]
    fn distinct_mechanisms_get_distinct_keys() {
        let sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let cm = vec![vec![true, true], vec![true, true]];
        let net = Arc::new(Network::from_state_by_state(sbs, cm, None).unwrap());
        let sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let a = MarblSet::canonical(&sub, &[0]);
        let b = MarblSet::canonical(&sub, &[1]);
        assert_ne!(a.content_key(), b.content_key());
    }

    #[test]
    fn differing_dynamics_on_identical_topology_get_distinct_keys() {
        // Same connectivity, same indices, same state — an OR gate at node 0
        // vs. an AND gate at node 0. A key that only looked at topology and
        // state would collide these.
        let or_sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let and_sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let cm = vec![vec![true, true], vec![true, true]];
        let or_net = Arc::new(Network::from_state_by_state(or_sbs, cm.clone(), None).unwrap());
        let and_net = Arc::new(Network::from_state_by_state(and_sbs, cm, None).unwrap());
        let or_sub = Subsystem::new(or_net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let and_sub = Subsystem::new(and_net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let a = MarblSet::canonical(&or_sub, &[0]);
        let b = MarblSet::canonical(&and_sub, &[0]);
        assert_ne!(a.content_key(), b.content_key());
    }

    #[test]
    fn cut_changes_the_key_for_the_same_mechanism() {
        let sbs = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let cm = vec![vec![true, true], vec![true, true]];
        let net = Arc::new(Network::from_state_by_state(sbs, cm, None).unwrap());
        let uncut = Subsystem::new(net.clone(), vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let cut_sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::directed(vec![0], vec![1])).unwrap();
        let a = MarblSet::canonical(&uncut, &[0]);
        let b = MarblSet::canonical(&cut_sub, &[0]);
        assert_ne!(a.content_key(), b.content_key());
    }
}
