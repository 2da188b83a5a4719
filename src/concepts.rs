//! Concepts and the cause-effect structure (CES) assembled from them.
//!
//! Grounded on `pyphi/models/subsystem.py` (`CauseEffectStructure`'s
//! canonical sort key) and `pyphi/subsystem.py::null_concept`.

use crate::cache::{CachedConceptEntry, Engine};
use crate::causality::{find_mice, is_mechanism_reducible_by_connectivity, RepertoireIrreducibilityAnalysis, MICE};
use crate::combinatorics::powerset_of;
use crate::config::Config;
use crate::error::Result;
use crate::marbl::MarblSet;
use crate::subsystem::{Direction, Subsystem};
use ndarray::ArrayD;

/// A mechanism's maximally irreducible cause and effect, and the phi of the
/// pair: `min(cause.phi, effect.phi)`.
#[derive(Debug, Clone)]
pub struct Concept {
    pub mechanism: Vec<usize>,
    pub cause: MICE,
    pub effect: MICE,
    pub phi: f64,
}

impl Concept {
    pub fn cause_repertoire(&self) -> &ArrayD<f64> {
        &self.cause.ria.repertoire
    }

    pub fn effect_repertoire(&self) -> &ArrayD<f64> {
        &self.effect.ria.repertoire
    }

    pub fn cause_purview(&self) -> &[usize] {
        &self.cause.ria.purview
    }

    pub fn effect_purview(&self) -> &[usize] {
        &self.effect.ria.purview
    }
}

/// The origin of concept space: the unconstrained repertoires of the empty
/// mechanism over the whole subsystem, for both directions. Every concept
/// is implicitly compared against this when no other concept shares its
/// mechanism across two cause-effect structures.
#[derive(Debug, Clone)]
pub struct NullConcept {
    pub cause_repertoire: ArrayD<f64>,
    pub effect_repertoire: ArrayD<f64>,
}

pub fn null_concept(subsystem: &Subsystem) -> NullConcept {
    NullConcept {
        cause_repertoire: subsystem.unconstrained_repertoire(Direction::Cause),
        effect_repertoire: subsystem.unconstrained_repertoire(Direction::Effect),
    }
}

/// A cause-effect structure: every concept with phi above `config.epsilon`,
/// in canonical order `(mechanism.len(), mechanism)` ascending — matching
/// `pyphi`'s `CauseEffectStructure` sort key, so two CESs built from the
/// same mechanism set always compare element-for-element.
#[derive(Debug, Clone, Default)]
pub struct CauseEffectStructure {
    pub concepts: Vec<Concept>,
}

impl CauseEffectStructure {
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn find(&self, mechanism: &[usize]) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.mechanism == mechanism)
    }
}

/// Build the cause-effect structure of `subsystem`: every non-empty
/// mechanism (subset of its nodes) that isn't trivially reducible by
/// connectivity, with phi above `config.epsilon`.
///
/// Without an `engine`, every mechanism's MICE is computed fresh. With one,
/// each mechanism is first looked up by its [`MarblSet`] (raw key, then
/// canonical) in the persistent concept cache; a hit reconstructs the
/// `Concept` directly from the cached summary, skipping the purview search
/// entirely.
pub fn identify_concepts(subsystem: &Subsystem, config: &Config, engine: Option<&Engine>) -> Result<CauseEffectStructure> {
    let mut concepts = Vec::new();

    for mechanism in powerset_of(&subsystem.indices).into_iter().filter(|m| !m.is_empty()) {
        if is_mechanism_reducible_by_connectivity(subsystem, &mechanism) {
            continue;
        }

        if let Some(engine) = engine {
            let raw = MarblSet::raw(subsystem, &mechanism);
            let canonical = MarblSet::canonical(subsystem, &mechanism);
            if let Some(entry) = engine.get_concept(&raw, &canonical) {
                if !config.below_epsilon(entry.phi) {
                    concepts.push(concept_from_cache(&mechanism, &entry));
                }
                continue;
            }

            let cause = find_mice(subsystem, Direction::Cause, &mechanism, config)?;
            let effect = find_mice(subsystem, Direction::Effect, &mechanism, config)?;
            let phi = cause.ria.phi.min(effect.ria.phi);
            engine.put_concept(&canonical, cache_entry(&mechanism, &cause.ria, &effect.ria, phi))?;
            if config.below_epsilon(phi) {
                continue;
            }
            concepts.push(Concept { mechanism, cause, effect, phi });
            continue;
        }

        let cause = find_mice(subsystem, Direction::Cause, &mechanism, config)?;
        let effect = find_mice(subsystem, Direction::Effect, &mechanism, config)?;
        let phi = cause.ria.phi.min(effect.ria.phi);
        if config.below_epsilon(phi) {
            continue;
        }
        concepts.push(Concept {
            mechanism,
            cause,
            effect,
            phi,
        });
    }

    concepts.sort_by(|a, b| (a.mechanism.len(), &a.mechanism).cmp(&(b.mechanism.len(), &b.mechanism)));

    Ok(CauseEffectStructure { concepts })
}

fn cache_entry(
    mechanism: &[usize],
    cause: &RepertoireIrreducibilityAnalysis,
    effect: &RepertoireIrreducibilityAnalysis,
    phi: f64,
) -> CachedConceptEntry {
    CachedConceptEntry {
        version: 0, // stamped by Engine::put_concept
        mechanism: mechanism.to_vec(),
        cause_purview: cause.purview.clone(),
        cause_phi: cause.phi,
        cause_repertoire: cause.repertoire.clone(),
        effect_purview: effect.purview.clone(),
        effect_phi: effect.phi,
        effect_repertoire: effect.repertoire.clone(),
        phi,
    }
}

fn concept_from_cache(mechanism: &[usize], entry: &CachedConceptEntry) -> Concept {
    let cause_ria = RepertoireIrreducibilityAnalysis {
        direction: Direction::Cause,
        mechanism: mechanism.to_vec(),
        purview: entry.cause_purview.clone(),
        phi: entry.cause_phi,
        partition: None,
        repertoire: entry.cause_repertoire.clone(),
        partitioned_repertoire: None,
    };
    let effect_ria = RepertoireIrreducibilityAnalysis {
        direction: Direction::Effect,
        mechanism: mechanism.to_vec(),
        purview: entry.effect_purview.clone(),
        phi: entry.effect_phi,
        partition: None,
        repertoire: entry.effect_repertoire.clone(),
        partitioned_repertoire: None,
    };
    Concept {
        mechanism: mechanism.to_vec(),
        cause: MICE { ria: cause_ria },
        effect: MICE { ria: effect_ria },
        phi: entry.phi,
    }
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
    fn or_gate_pair_has_concepts() {
        let net = or_network();
        let sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let ces = identify_concepts(&sub, &Config::default(), None).unwrap();
        assert!(!ces.is_empty());
        for pair in ces.concepts.windows(2) {
            let a = (pair[0].mechanism.len(), &pair[0].mechanism);
            let b = (pair[1].mechanism.len(), &pair[1].mechanism);
            assert!(a <= b);
        }
    }

    #[test]
    fn disconnected_pair_has_no_concepts() {
        let cm = vec![vec![true, false], vec![false, true]];
        let net = Arc::new(Network::new(ndarray::Array::zeros(ndarray::IxDyn(&[2, 2, 2])), cm, None).unwrap());
        let sub = Subsystem::new(net, vec![0, 0], vec![0, 1], Cut::Null).unwrap();
        let ces = identify_concepts(&sub, &Config::default(), None).unwrap();
        assert!(ces.is_empty());
    }

    #[test]
    fn engine_cache_reproduces_uncached_result() {
        let net = or_network();
        let sub = Subsystem::new(net, vec![1, 1], vec![0, 1], Cut::Null).unwrap();
        let config = Config::default();
        let engine = crate::cache::Engine::new(config.clone());

        let fresh = identify_concepts(&sub, &config, Some(&engine)).unwrap();
        let (hits_after_first, misses_after_first) = engine.cache_stats();
        assert_eq!(hits_after_first, 0);
        assert!(misses_after_first > 0);

        let cached = identify_concepts(&sub, &config, Some(&engine)).unwrap();
        let (hits_after_second, _) = engine.cache_stats();
        assert!(hits_after_second >= misses_after_first);

        assert_eq!(fresh.len(), cached.len());
        for (a, b) in fresh.concepts.iter().zip(cached.concepts.iter()) {
            assert_eq!(a.mechanism, b.mechanism);
            assert!((a.phi - b.phi).abs() < 1e-9);
        }
    }
}
