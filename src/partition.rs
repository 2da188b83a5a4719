//! Bipartition enumeration for both levels of the search: mechanism/purview
//! bipartitions for the MIP search (spec.md §4.4), and whole-subsystem node
//! bipartitions for the cut search (spec.md §4.8), named `partition` to
//! match the teacher crate's module (its `phi.rs` imports `find_mip`,
//! `CutType`, `Partition`, `PartitionInfo` from here).

use crate::combinatorics::{bipartitions, mip_bipartitions, MechanismPurviewBipartition};
use crate::config::PartitionType;
use crate::cut::Cut;
use crate::error::{IITError, Result};

pub use crate::combinatorics::MechanismPurviewPart;

/// Whether a subsystem-level cut severs connections in one direction only,
/// or is tested in both directions (the standard unidirectional-cut search
/// evaluates a candidate bipartition's cut both ways and keeps the smaller
/// phi of the two).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutType {
    Unidirectional,
    Bidirectional,
}

/// A candidate subsystem-level cut: the two parts of a bipartition, cut in
/// the given direction(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub part_a: Vec<usize>,
    pub part_b: Vec<usize>,
    pub cut: Cut,
}

/// Metadata about a partition search outcome: the winning partition and the
/// phi value it achieved.
#[derive(Debug, Clone)]
pub struct PartitionInfo {
    pub partition: Partition,
    pub phi: f64,
}

/// Every nontrivial subsystem-level cut of `0..n`, in both directions when
/// `cut_type` is [`CutType::Bidirectional`]. Excludes the null partition
/// (the whole system as one part).
pub fn all_bipartitions(n: usize, cut_type: CutType) -> Vec<Partition> {
    let nodes: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    for (a, b) in bipartitions(&nodes).into_iter().skip(1) {
        out.push(Partition {
            part_a: a.clone(),
            part_b: b.clone(),
            cut: Cut::directed(a.clone(), b.clone()),
        });
        if cut_type == CutType::Bidirectional {
            out.push(Partition {
                part_a: a.clone(),
                part_b: b.clone(),
                cut: Cut::directed(b, a),
            });
        }
    }
    out
}

/// Enumerate the bipartitions of `(mechanism, purview)` the MIP search
/// should consider, according to `partition_type`.
///
/// Only [`PartitionType::Bi`] is implemented; `Tri`/`All` return
/// [`IITError::Configuration`] (see DESIGN.md, Open Question 2).
pub fn mechanism_partitions(
    mechanism: &[usize],
    purview: &[usize],
    partition_type: PartitionType,
) -> Result<Vec<MechanismPurviewBipartition>> {
    match partition_type {
        PartitionType::Bi => Ok(mip_bipartitions(mechanism, purview)),
        PartitionType::Tri => Err(IITError::Configuration(
            "PartitionType::Tri is not implemented; use PartitionType::Bi".into(),
        )),
        PartitionType::All => Err(IITError::Configuration(
            "PartitionType::All is not implemented; use PartitionType::Bi".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidirectional_doubles_unidirectional_count() {
        let uni = all_bipartitions(3, CutType::Unidirectional);
        let bi = all_bipartitions(3, CutType::Bidirectional);
        assert_eq!(bi.len(), uni.len() * 2);
    }

    #[test]
    fn tri_partition_type_rejected() {
        let result = mechanism_partitions(&[0], &[0, 1], PartitionType::Tri);
        assert!(result.is_err());
    }
}
