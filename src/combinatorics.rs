//! Enumeration helpers: powersets, bipartitions, state indexing.
//!
//! Grounded on `cyphi/utils.py` (`powerset`, `bipartition`, `combs`).

use itertools::Itertools;
use std::collections::HashSet;

/// All subsets of `indices`, including the empty set and the full set, in
/// the order produced by counting a bitmask over `indices.len()` bits.
pub fn powerset_of(indices: &[usize]) -> Vec<Vec<usize>> {
    let n = indices.len();
    (0..(1usize << n))
        .map(|mask| {
            (0..n)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| indices[i])
                .collect()
        })
        .collect()
}

/// All k-combinations of `indices`.
pub fn combinations(indices: &[usize], k: usize) -> Vec<Vec<usize>> {
    if k > indices.len() {
        return Vec::new();
    }
    indices.iter().copied().combinations(k).collect()
}

/// All bipartitions `(A, B)` of `nodes` such that `A` and `B` partition
/// `nodes`, deduplicated under swap by fixing the first element's side via a
/// bitmask over the remaining `n - 1` elements.
///
/// The first entry returned is always `(vec![], nodes.to_vec())` — the null
/// partition — matching `cyphi/utils.py::bipartition`, whose callers skip
/// index 0 when they need only non-trivial cuts.
pub fn bipartitions(nodes: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let n = nodes.len();
    if n == 0 {
        return vec![(Vec::new(), Vec::new())];
    }
    let mut out = Vec::with_capacity(1usize << (n - 1));
    for mask in 0..(1usize << (n - 1)) {
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (i, &node) in nodes.iter().enumerate() {
            if i < n - 1 && mask & (1 << i) != 0 {
                a.push(node);
            } else {
                b.push(node);
            }
        }
        out.push((a, b));
    }
    out
}

/// One part of a bipartition that jointly splits a mechanism and a purview.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MechanismPurviewPart {
    pub mechanism: Vec<usize>,
    pub purview: Vec<usize>,
}

/// A two-part partition of `(mechanism, purview)`, as searched over by the
/// mechanism-level MIP (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismPurviewBipartition {
    pub parts: [MechanismPurviewPart; 2],
}

/// Enumerate every bipartition `((M1, P1), (M2, P2))` of `(mechanism,
/// purview)` with `M1 ⊎ M2 = mechanism`, `P1 ⊎ P2 = purview`, excluding the
/// trivial identity partition and parts where both the mechanism- and
/// purview-side are empty, deduplicated under swap of the two parts.
///
/// `mechanism` and `purview` must each be sorted; this isn't checked.
pub fn mip_bipartitions(mechanism: &[usize], purview: &[usize]) -> Vec<MechanismPurviewBipartition> {
    let mech_subsets = powerset_of(mechanism);
    let purv_subsets = powerset_of(purview);

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for m1 in &mech_subsets {
        let m1_set: HashSet<usize> = m1.iter().copied().collect();
        let m2: Vec<usize> = mechanism.iter().copied().filter(|i| !m1_set.contains(i)).collect();
        for p1 in &purv_subsets {
            let p1_set: HashSet<usize> = p1.iter().copied().collect();
            let p2: Vec<usize> = purview.iter().copied().filter(|i| !p1_set.contains(i)).collect();

            // A part with neither mechanism nor purview elements is vacuous;
            // this also excludes the trivial identity partition, whose
            // "other side" is always empty on both axes.
            if (m1.is_empty() && p1.is_empty()) || (m2.is_empty() && p2.is_empty()) {
                continue;
            }

            let mut a = MechanismPurviewPart {
                mechanism: m1.clone(),
                purview: p1.clone(),
            };
            let mut b = MechanismPurviewPart {
                mechanism: m2.clone(),
                purview: p2.clone(),
            };
            if b < a {
                std::mem::swap(&mut a, &mut b);
            }
            let key = (a.clone(), b.clone());
            if !seen.insert(key) {
                continue;
            }
            out.push(MechanismPurviewBipartition { parts: [a, b] });
        }
    }
    out
}

/// The binary state vector for `index` over `n` bits, with element 0 as the
/// most-significant bit. This convention is used everywhere states are
/// indexed into a flat array (distributions, EMD ground distances).
pub fn state_from_index(index: usize, n: usize) -> Vec<usize> {
    let mut idx = index;
    let mut state = vec![0usize; n];
    for i in (0..n).rev() {
        state[i] = idx & 1;
        idx >>= 1;
    }
    state
}

/// Inverse of [`state_from_index`].
pub fn index_from_state(state: &[usize]) -> usize {
    state.iter().fold(0usize, |acc, &b| acc * 2 + b)
}

/// All `2^n` binary states of length `n`, in index order.
pub fn all_states(n: usize) -> impl Iterator<Item = Vec<usize>> {
    (0..(1usize << n)).map(move |idx| state_from_index(idx, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powerset_size() {
        assert_eq!(powerset_of(&[0, 1, 2]).len(), 8);
        assert_eq!(powerset_of(&[]).len(), 1);
    }

    #[test]
    fn bipartitions_count_and_null() {
        let parts = bipartitions(&[0, 1, 2]);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], (vec![], vec![0, 1, 2]));
    }

    #[test]
    fn state_index_roundtrip() {
        for n in 1..5 {
            for idx in 0..(1usize << n) {
                let s = state_from_index(idx, n);
                assert_eq!(index_from_state(&s), idx);
            }
        }
    }

    #[test]
    fn mip_bipartitions_excludes_identity() {
        let parts = mip_bipartitions(&[0, 1], &[0, 1]);
        for p in &parts {
            let whole = (vec![0, 1], vec![0, 1]);
            let empty = (Vec::<usize>::new(), Vec::<usize>::new());
            let a = (p.parts[0].mechanism.clone(), p.parts[0].purview.clone());
            let b = (p.parts[1].mechanism.clone(), p.parts[1].purview.clone());
            assert!(!(a == whole && b == empty));
            assert!(!(b == whole && a == empty));
        }
    }
}
