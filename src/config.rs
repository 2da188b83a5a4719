//! Configuration surface (spec.md §6): the knobs that change how Φ is
//! computed, threaded explicitly through calls rather than read from a
//! global, per spec.md §9's "inject explicit handles, not global
//! singletons" redesign note — the same shape the teacher uses for
//! `PhiConfig`/`ConceptConfig`, just widened to cover the whole pipeline.

use serde::{Deserialize, Serialize};

/// Which bipartitions the mechanism-level MIP search considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionType {
    /// Strict two-part bipartitions of `(mechanism, purview)`. The only
    /// implemented variant (see DESIGN.md, Open Question 2).
    Bi,
    /// Triadic partitions used by some PyPhi revisions for concept-style
    /// cuts. Recognized but not implemented: `find_mip` rejects this with
    /// `IITError::Configuration`.
    Tri,
    /// All partitions up to a given arity. Recognized but not implemented.
    All,
}

impl Default for PartitionType {
    fn default() -> Self {
        PartitionType::Bi
    }
}

/// Which ground metric/algorithm to use for repertoire distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepertoireDistance {
    /// Earth Mover's Distance with Hamming ground metric — the spec'd
    /// default, grounded on `cyphi/utils.py::emd`.
    HammingEmd,
    /// L1 (total variation, up to a factor of 2) distance. Kept as a cheap
    /// alternative for large purviews where exact EMD is too slow; not the
    /// default.
    L1,
}

impl Default for RepertoireDistance {
    fn default() -> Self {
        RepertoireDistance::HammingEmd
    }
}

/// Which revision of the Φ calculation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IitVersion {
    /// The version implemented by this crate (spec.md's default).
    Classic,
    /// A later PyPhi revision with a different MICE tie-break
    /// ("maximal-state-first"). Recognized but not implemented.
    MaximalStateFirst,
}

impl Default for IitVersion {
    fn default() -> Self {
        IitVersion::Classic
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Distances and phi values at or below this are treated as zero.
    pub epsilon: f64,
    /// Evaluate subsystem cuts concurrently via rayon.
    pub parallel_cut_evaluation: bool,
    /// Whether a single node with a self-loop has phi > 0 (0.5 by
    /// convention) or is always reducible (phi = 0).
    pub single_nodes_with_selfloops_have_phi: bool,
    pub repertoire_distance: RepertoireDistance,
    pub partition_type: PartitionType,
    pub iit_version: IitVersion,
    /// Soft cap, in number of cached entries, applied to the in-process LRU
    /// caches (approximates spec.md's `MAXMEM` byte budget; see DESIGN.md).
    pub max_cache_entries: usize,
    /// Directory for the persistent, content-addressed concept cache. `None`
    /// disables persistence (in-memory only).
    pub cache_dir: Option<std::path::PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            epsilon: 1e-10,
            parallel_cut_evaluation: true,
            single_nodes_with_selfloops_have_phi: false,
            repertoire_distance: RepertoireDistance::default(),
            partition_type: PartitionType::default(),
            iit_version: IitVersion::default(),
            max_cache_entries: 100_000,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn below_epsilon(&self, value: f64) -> bool {
        value <= self.epsilon
    }
}
