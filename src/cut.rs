//! Unidirectional cuts applied to a subsystem's connectivity matrix.
//!
//! Modeled as a tagged enum rather than a trait object, per spec.md §9's
//! note that `Direction`/`Cut` polymorphism should use "a small closed set
//! of variants" — the set of cut shapes is fixed by the algorithm, so a
//! `dyn Cut` trait would only add an indirection with no extensibility
//! payoff.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cut {
    /// No connections severed; the identity cut.
    Null,
    /// Severs every edge from a node in `from` to a node in `to`. Edges
    /// within `from`, within `to`, or from `to` to `from` are untouched.
    Directed { from: Vec<usize>, to: Vec<usize> },
    /// A general k-part partition with a direction assigned between each
    /// ordered pair of distinct parts whose edges should be severed.
    /// `PARTITION_TYPE=TRI`/`ALL` aren't implemented (see DESIGN.md); this
    /// variant exists so the type can represent them once they are.
    K { parts: Vec<Vec<usize>>, severed: Vec<(usize, usize)> },
}

impl Cut {
    pub fn directed(from: Vec<usize>, to: Vec<usize>) -> Self {
        Cut::Directed { from, to }
    }

    /// Apply this cut to `cm`, zeroing out severed edges. `cm` is square
    /// over the full node index range the cut's indices refer to.
    pub fn apply(&self, cm: &[Vec<bool>]) -> Vec<Vec<bool>> {
        let mut out = cm.to_vec();
        match self {
            Cut::Null => {}
            Cut::Directed { from, to } => {
                for &i in from {
                    for &j in to {
                        if i < out.len() && j < out.len() {
                            out[i][j] = false;
                        }
                    }
                }
            }
            Cut::K { parts, severed } => {
                for &(pi, pj) in severed {
                    if pi == pj {
                        continue;
                    }
                    for &i in &parts[pi] {
                        for &j in &parts[pj] {
                            if i < out.len() && j < out.len() {
                                out[i][j] = false;
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// Whether `mechanism` has elements on both sides of this cut (and so is
    /// necessarily affected by it).
    pub fn splits_mechanism(&self, mechanism: &[usize]) -> bool {
        match self {
            Cut::Null => false,
            Cut::Directed { from, to } => {
                let from: HashSet<_> = from.iter().collect();
                let to: HashSet<_> = to.iter().collect();
                mechanism.iter().any(|m| from.contains(m)) && mechanism.iter().any(|m| to.contains(m))
            }
            Cut::K { parts, .. } => {
                let sides: Vec<bool> = parts
                    .iter()
                    .map(|part| mechanism.iter().any(|m| part.contains(m)))
                    .collect();
                sides.iter().filter(|&&hit| hit).count() > 1
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cut::Null)
    }
}

impl Default for Cut {
    fn default() -> Self {
        Cut::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_cut_identity() {
        let cm = vec![vec![true, true], vec![true, true]];
        assert_eq!(Cut::Null.apply(&cm), cm);
    }

    #[test]
    fn directed_cut_severs_only_named_edges() {
        let cm = vec![vec![true, true], vec![true, true]];
        let cut = Cut::directed(vec![0], vec![1]);
        let cut_cm = cut.apply(&cm);
        assert!(!cut_cm[0][1]);
        assert!(cut_cm[1][0]);
        assert!(cut_cm[0][0]);
    }

    #[test]
    fn splits_mechanism_detects_straddling() {
        let cut = Cut::directed(vec![0], vec![1]);
        assert!(cut.splits_mechanism(&[0, 1]));
        assert!(!cut.splits_mechanism(&[0]));
    }
}
