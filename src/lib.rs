//! Core engine for evaluating integrated information (Φ) of discrete
//! binary-node networks under Integrated Information Theory.
//!
//! The modules below mirror the pipeline: a [`Network`] is conditioned into
//! a [`Subsystem`], whose mechanisms are searched for irreducible
//! cause-effect power ([`causality`]) to assemble a cause-effect structure
//! ([`concepts`]), which is then compared across every subsystem cut to
//! find big-Φ ([`phi`]). [`cache::Engine`] and [`config::Config`] are
//! constructed by the caller and threaded through explicitly — there is no
//! global state.
//!
//! [`IITSystem`] is a small facade over this pipeline for simple,
//! single-network use; the modules above are the actual library surface
//! for anything more involved (batches, custom caching, complex search).

pub mod cache;
pub mod causality;
pub mod combinatorics;
pub mod concepts;
pub mod config;
pub mod cut;
pub mod distance;
pub mod distribution;
pub mod error;
pub mod marbl;
pub mod network;
pub mod node;
pub mod partition;
pub mod phi;
pub mod repertoire;
pub mod subsystem;

pub use cache::Engine;
pub use concepts::{Concept, CauseEffectStructure};
pub use config::Config;
pub use cut::Cut;
pub use error::{IITError, Result};
pub use network::Network;
pub use phi::BigMip;
pub use subsystem::{Direction, Subsystem};

use ndarray::{Array2, ArrayD, IxDyn};
use std::sync::Arc;

/// A small, stateful facade over a single [`Network`]: build the
/// connectivity and state incrementally, then ask for Φ or the
/// cause-effect structure without touching the lower-level modules.
///
/// For anything beyond a single network at a time — custom caching,
/// complex search across many candidate subsystems, or a non-uniform TPM —
/// use [`Network`], [`Subsystem`], and [`phi::sia`] directly.
pub struct IITSystem {
    n: usize,
    cm: Vec<Vec<bool>>,
    state: Vec<usize>,
    sbs_tpm: Array2<f64>,
    node_labels: Option<Vec<String>>,
    config: Config,
}

impl IITSystem {
    /// A new system of `n` nodes, all OFF, with no connections and the
    /// identity TPM (every state maps to itself with probability 1) until
    /// [`IITSystem::set_connection`] and [`IITSystem::set_transition`] are
    /// called.
    pub fn new(n: usize) -> Self {
        let dim = 1usize << n;
        let sbs_tpm = Array2::from_shape_fn((dim, dim), |(i, j)| if i == j { 1.0 } else { 0.0 });
        IITSystem {
            n,
            cm: vec![vec![false; n]; n],
            state: vec![0; n],
            sbs_tpm,
            node_labels: None,
            config: Config::default(),
        }
    }

    pub fn set_connection(&mut self, from: usize, to: usize, connected: bool) -> &mut Self {
        self.cm[from][to] = connected;
        self
    }

    pub fn set_state(&mut self, state: Vec<usize>) -> &mut Self {
        assert_eq!(state.len(), self.n, "state length must match node count");
        self.state = state;
        self
    }

    pub fn state(&self) -> &[usize] {
        &self.state
    }

    /// Set the full state-by-state transition probability: `P(next = to |
    /// current = from)`.
    pub fn set_transition(&mut self, from: usize, to: usize, probability: f64) -> &mut Self {
        self.sbs_tpm[(from, to)] = probability;
        self
    }

    pub fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    pub fn set_node_labels(&mut self, labels: Vec<String>) -> &mut Self {
        self.node_labels = Some(labels);
        self
    }

    fn network(&self) -> Result<Arc<Network>> {
        Ok(Arc::new(Network::from_state_by_state(
            self.sbs_tpm.clone(),
            self.cm.clone(),
            self.node_labels.clone(),
        )?))
    }

    /// Run the system irreducibility analysis over the whole network (all
    /// `n` nodes as one subsystem) and return its big-Φ.
    pub fn calculate_phi(&self) -> Result<f64> {
        let network = self.network()?;
        let indices: Vec<usize> = (0..self.n).collect();
        let mip = phi::sia(network, self.state.clone(), indices, &self.config, None)?;
        Ok(mip.phi)
    }

    /// Run the full system irreducibility analysis and return it.
    pub fn analyze(&self) -> Result<BigMip> {
        let network = self.network()?;
        let indices: Vec<usize> = (0..self.n).collect();
        phi::sia(network, self.state.clone(), indices, &self.config, None)
    }

    /// The cause-effect structure of the whole network at its current
    /// state, with no cut applied.
    pub fn identify_concepts(&self) -> Result<CauseEffectStructure> {
        let network = self.network()?;
        let indices: Vec<usize> = (0..self.n).collect();
        let subsystem = Subsystem::new(network, self.state.clone(), indices, Cut::Null)?;
        concepts::identify_concepts(&subsystem, &self.config, None)
    }
}

/// A small builder mirroring [`IITSystem`]'s setters, for call sites that
/// prefer to assemble a system in one expression.
#[derive(Default)]
pub struct IITSystemBuilder {
    n: Option<usize>,
    connections: Vec<(usize, usize)>,
    state: Option<Vec<usize>>,
    config: Option<Config>,
}

impl IITSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    pub fn connect(mut self, from: usize, to: usize) -> Self {
        self.connections.push((from, to));
        self
    }

    pub fn state(mut self, state: Vec<usize>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> IITSystem {
        let n = self.n.expect("IITSystemBuilder::nodes must be called before build");
        let mut system = IITSystem::new(n);
        for (from, to) in self.connections {
            system.set_connection(from, to, true);
        }
        if let Some(state) = self.state {
            system.set_state(state);
        }
        if let Some(config) = self.config {
            system.set_config(config);
        }
        system
    }
}

/// A fully-connected network of `n` nodes, each an OR of every node's
/// previous state, for quick experimentation.
pub fn fully_connected_system(n: usize) -> IITSystem {
    let mut system = IITSystem::new(n);
    let dim = 1usize << n;
    for i in 0..n {
        for j in 0..n {
            system.set_connection(i, j, true);
        }
    }
    let sbs_tpm = Array2::from_shape_fn((dim, dim), |(from, to)| {
        let from_bits = crate::combinatorics::state_from_index(from, n);
        let any_on = from_bits.iter().any(|&b| b == 1);
        let next = if any_on { (1usize << n) - 1 } else { 0 };
        if to == next {
            1.0
        } else {
            0.0
        }
    });
    system.sbs_tpm = sbs_tpm;
    system
}

/// A feedforward chain `0 -> 1 -> ... -> n-1`, each node copying its
/// predecessor's previous state (node 0 stays OFF forever with no input).
pub fn feedforward_system(n: usize) -> IITSystem {
    let mut system = IITSystem::new(n);
    for i in 0..n.saturating_sub(1) {
        system.set_connection(i, i + 1, true);
    }
    let mut sbn_tpm = ArrayD::zeros(IxDyn(&std::iter::repeat(2).take(n).chain(std::iter::once(n)).collect::<Vec<_>>()));
    for state_idx in 0..(1usize << n) {
        let bits = crate::combinatorics::state_from_index(state_idx, n);
        for node in 0..n {
            let on = if node == 0 { 0.0 } else { bits[node - 1] as f64 };
            let mut idx = bits.clone();
            idx.push(node);
            sbn_tpm[idx.as_slice()] = on;
        }
    }
    system.sbs_tpm = network::sbn_to_sbs(&sbn_tpm, n);
    system
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_node_or_system_has_positive_phi() {
        let mut system = IITSystem::new(2);
        system.set_connection(0, 1, true);
        system.set_connection(1, 0, true);
        system.set_transition(0, 0, 1.0);
        system.set_transition(1, 3, 1.0);
        system.set_transition(2, 3, 1.0);
        system.set_transition(3, 3, 1.0);
        system.set_state(vec![1, 1]);
        let phi = system.calculate_phi().unwrap();
        assert!(phi >= 0.0);
    }

    #[test]
    fn builder_produces_a_usable_system() {
        let system = IITSystemBuilder::new()
            .nodes(2)
            .connect(0, 1)
            .connect(1, 0)
            .state(vec![0, 0])
            .build();
        assert!(system.calculate_phi().is_ok());
    }
}
