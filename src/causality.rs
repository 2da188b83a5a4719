//! Mechanism-level search: the Minimum Information Partition (MIP) for a
//! given `(mechanism, purview, direction)`, and the Maximally Irreducible
//! Cause/Effect (MIC/MIE) search over purviews.
//!
//! Grounded on `pyphi/subsystem.py` (`find_mip`, `find_mice`) and
//! `cyphi/compute.py::concept` (the connectivity short-circuit).

use crate::config::Config;
use crate::distribution::flatten_over_purview;
use crate::error::{clamp_phi, IITError, Result};
use crate::combinatorics::{powerset_of, MechanismPurviewBipartition};
use crate::distance::repertoire_distance;
use crate::partition::mechanism_partitions;
use crate::subsystem::{Direction, Subsystem};
use ndarray::ArrayD;

/// The outcome of a mechanism-level MIP search: the phi value, the winning
/// partition (`None` for a trivially irreducible mechanism/purview pair),
/// and both the unpartitioned and partitioned repertoires that produced it.
#[derive(Debug, Clone)]
pub struct RepertoireIrreducibilityAnalysis {
    pub direction: Direction,
    pub mechanism: Vec<usize>,
    pub purview: Vec<usize>,
    pub phi: f64,
    pub partition: Option<MechanismPurviewBipartition>,
    pub repertoire: ArrayD<f64>,
    pub partitioned_repertoire: Option<ArrayD<f64>>,
}

pub type RIA = RepertoireIrreducibilityAnalysis;

/// The winning purview for a mechanism in a given direction, and its MIP
/// analysis.
#[derive(Debug, Clone)]
pub struct MICE {
    pub ria: RIA,
}

/// Find the minimum information partition of `(mechanism, purview)` in
/// `direction`: the bipartition whose partitioned repertoire is closest (by
/// `config.repertoire_distance`) to the unpartitioned one.
pub fn find_mip(
    subsystem: &Subsystem,
    direction: Direction,
    mechanism: &[usize],
    purview: &[usize],
    config: &Config,
) -> Result<RIA> {
    let unpartitioned = subsystem.repertoire(direction, mechanism, purview);

    if mechanism.is_empty() || purview.is_empty() {
        return Ok(RIA {
            direction,
            mechanism: mechanism.to_vec(),
            purview: purview.to_vec(),
            phi: 0.0,
            partition: None,
            repertoire: unpartitioned,
            partitioned_repertoire: None,
        });
    }

    let candidates = mechanism_partitions(mechanism, purview, config.partition_type)?;
    if candidates.is_empty() {
        return Ok(RIA {
            direction,
            mechanism: mechanism.to_vec(),
            purview: purview.to_vec(),
            phi: 0.0,
            partition: None,
            repertoire: unpartitioned,
            partitioned_repertoire: None,
        });
    }

    let unpartitioned_flat = flatten_over_purview(&unpartitioned, purview);

    let mut best_phi = f64::INFINITY;
    let mut best_partition = None;
    let mut best_repertoire: Option<ArrayD<f64>> = None;

    for candidate in candidates {
        let [a, b] = &candidate.parts;
        let rep_a = subsystem.repertoire(direction, &a.mechanism, &a.purview);
        let rep_b = subsystem.repertoire(direction, &b.mechanism, &b.purview);
        let joint = crate::distribution::broadcast_mul(&rep_a, &rep_b);
        let joint = crate::distribution::normalize(joint).unwrap_or(joint);

        let partitioned_flat = flatten_over_purview(&joint, purview);
        let phi = repertoire_distance(&unpartitioned_flat, &partitioned_flat, purview.len(), config.repertoire_distance)?;

        if phi < best_phi - 1e-12 {
            best_phi = phi;
            best_partition = Some(candidate);
            best_repertoire = Some(joint);
        }
    }

    Ok(RIA {
        direction,
        mechanism: mechanism.to_vec(),
        purview: purview.to_vec(),
        phi: clamp_phi(best_phi),
        partition: best_partition,
        repertoire: unpartitioned,
        partitioned_repertoire: best_repertoire,
    })
}

/// Search every non-empty subset of the subsystem's nodes as a candidate
/// purview for `mechanism` in `direction`, keeping the one with the largest
/// phi. Ties break toward the smaller purview, then the
/// lexicographically smaller index set.
pub fn find_mice(subsystem: &Subsystem, direction: Direction, mechanism: &[usize], config: &Config) -> Result<MICE> {
    let mut best: Option<RIA> = None;

    for purview in powerset_of(&subsystem.indices).into_iter().filter(|p| !p.is_empty()) {
        let ria = find_mip(subsystem, direction, mechanism, &purview, config)?;
        best = Some(match best {
            None => ria,
            Some(current) => {
                if ria.phi > current.phi + config.epsilon {
                    ria
                } else if (ria.phi - current.phi).abs() <= config.epsilon && smaller(&ria, &current) {
                    ria
                } else {
                    current
                }
            }
        });
    }

    let ria = best.ok_or_else(|| IITError::InvalidMechanism("mechanism has no candidate purviews to search".into()))?;
    Ok(MICE { ria })
}

fn smaller(candidate: &RIA, current: &RIA) -> bool {
    if candidate.purview.len() != current.purview.len() {
        candidate.purview.len() < current.purview.len()
    } else {
        candidate.purview < current.purview
    }
}

/// Whether `mechanism` is trivially reducible because it has no input from,
/// or no output to, the rest of `subsystem` — both cause and effect
/// concepts are null in that case, so the purview search can be skipped
/// entirely.
///
/// Grounded on `cyphi/compute.py::concept`'s `_all_connect_to_any` /
/// `_any_connect_to_all` short-circuit.
pub fn is_mechanism_reducible_by_connectivity(subsystem: &Subsystem, mechanism: &[usize]) -> bool {
    let others: Vec<usize> = subsystem.indices.iter().copied().filter(|i| !mechanism.contains(i)).collect();
    if others.is_empty() {
        return false;
    }
    let any_input = others.iter().any(|&o| mechanism.iter().any(|&m| subsystem.cm[o][m]));
    let any_output = others.iter().any(|&o| mechanism.iter().any(|&m| subsystem.cm[m][o]));
    !any_input || !any_output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::Cut;
    use crate::network::Network;
    use ndarray::array;
    use std::sync::Arc;

    fn or_network() -> Arc<Network> {
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
    fn find_mice_returns_some_purview() {
        let net = or_network();
        let sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let config = Config::default();
        let mice = find_mice(&sub, Direction::Cause, &[0], &config).unwrap();
        assert!(!mice.ria.purview.is_empty());
        assert!(mice.ria.phi >= 0.0);
    }

    #[test]
    fn disconnected_mechanism_is_reducible() {
        let cm = vec![vec![true, false], vec![false, true]];
        let net = Arc::new(Network::new(
            ndarray::Array::zeros(ndarray::IxDyn(&[2, 2, 2])),
            cm,
            None,
        ).unwrap());
        let sub = Subsystem::new(net, vec![0, 0], vec![0, 1], Cut::Null).unwrap();
        assert!(is_mechanism_reducible_by_connectivity(&sub, &[0]));
    }
}
