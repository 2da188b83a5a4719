//! `Repertoire`: a named, directed probability distribution over a purview,
//! as a standalone value type for serialization and inspection.
//!
//! The actual repertoire *computation* lives on [`crate::subsystem::Subsystem`]
//! (`cause_repertoire`/`effect_repertoire`), since it needs the subsystem's
//! conditioned TPM; this module wraps the resulting array with the purview
//! and direction it belongs to, matching spec.md §3's `Repertoire` data
//! model entry.

pub use crate::subsystem::Direction;

use crate::distribution::purview_of;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// A probability distribution over `purview`, stored at full network rank
/// (singleton axes outside `purview`) so it can be multiplied directly
/// against other repertoires over different purviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repertoire {
    pub direction: Direction,
    pub purview: Vec<usize>,
    #[serde(with = "ndarray_serde")]
    pub distribution: ArrayD<f64>,
}

impl Repertoire {
    pub fn new(direction: Direction, distribution: ArrayD<f64>) -> Self {
        let purview = purview_of(distribution.shape());
        Repertoire {
            direction,
            purview,
            distribution,
        }
    }

    /// Shannon entropy of the flattened distribution over its purview, in
    /// bits.
    pub fn entropy(&self) -> f64 {
        self.distribution
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.log2())
            .sum()
    }

    pub fn n_states(&self) -> usize {
        1usize << self.purview.len()
    }
}

/// `ArrayD` already implements `Serialize`/`Deserialize` behind the
/// `ndarray/serde` feature; this module exists only to name the attribute
/// above for documentation purposes and is otherwise a pass-through.
mod ndarray_serde {
    use ndarray::ArrayD;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &ArrayD<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ArrayD<f64>, D::Error> {
        ArrayD::<f64>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::max_entropy_distribution;

    #[test]
    fn uniform_repertoire_entropy_matches_log2_states() {
        let dist = max_entropy_distribution(&[0, 1], 2);
        let rep = Repertoire::new(Direction::Cause, dist);
        assert!((rep.entropy() - 2.0).abs() < 1e-9);
    }
}
