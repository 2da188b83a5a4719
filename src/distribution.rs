//! Repertoire-shaped array operations: every repertoire in this crate is
//! stored at full network rank, with a length-2 axis for nodes in its
//! purview and a length-1 (broadcastable) axis everywhere else. This keeps
//! elementwise products of repertoires over different purviews well-defined
//! without any reshaping step.
//!
//! Grounded on `pyphi/node.py` (marginalization/conditioning over TPM axes)
//! and `cyphi/utils.py` (`uniform_distribution`, `marginalize_out`).

use crate::error::{IITError, Result};
use ndarray::{Array, ArrayD, IxDyn};

/// The shape of a repertoire array over `tpm_size` network nodes: axis `i`
/// has length 2 if `i` is in `purview`, else length 1.
pub fn repertoire_shape(purview: &[usize], tpm_size: usize) -> Vec<usize> {
    (0..tpm_size).map(|i| if purview.contains(&i) { 2 } else { 1 }).collect()
}

/// The maximum-entropy (uniform) distribution over `purview`, singleton
/// elsewhere. An empty purview gives the all-ones scalar array (shape all
/// 1s), representing the constant distribution with total mass 1.
pub fn max_entropy_distribution(purview: &[usize], tpm_size: usize) -> ArrayD<f64> {
    let shape = repertoire_shape(purview, tpm_size);
    let n_states = 1usize << purview.len();
    Array::from_elem(IxDyn(&shape), 1.0 / n_states as f64)
}

/// Rescale `dist` so it sums to 1.
pub fn normalize(mut dist: ArrayD<f64>) -> Result<ArrayD<f64>> {
    let sum: f64 = dist.iter().sum();
    if !(sum > 0.0) {
        return Err(IITError::NumericalInstability(
            "repertoire sums to zero or is non-finite; cannot normalize".into(),
        ));
    }
    dist.mapv_inplace(|p| p / sum);
    Ok(dist)
}

/// The set of axes with length 2, i.e. the purview this array is shaped for.
pub fn purview_of(shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 2)
        .map(|(i, _)| i)
        .collect()
}

/// Marginalize `nodes` out of `array`: for each such axis, replace it with
/// its mean (sum divided by axis length), collapsed back to a singleton
/// axis so the array keeps its full rank.
///
/// This is the convention `pyphi` uses for conditional-probability TPMs,
/// where an axis being marginalized isn't itself a probability mass to sum
/// but a parent whose influence should be averaged out.
pub fn marginalize_out(nodes: &[usize], array: &ArrayD<f64>) -> ArrayD<f64> {
    let mut result = array.clone();
    for &axis in nodes {
        let len = result.shape()[axis];
        if len > 1 {
            let summed = result.sum_axis(ndarray::Axis(axis));
            let averaged = summed.mapv(|v| v / len as f64);
            result = averaged.insert_axis(ndarray::Axis(axis));
        }
    }
    result
}

/// Condition `array` on `state` at each axis in `nodes`: select the given
/// index along that axis and collapse it back to a singleton.
pub fn condition(array: &ArrayD<f64>, nodes: &[usize], state: &[usize]) -> ArrayD<f64> {
    let mut result = array.clone();
    for (&axis, &value) in nodes.iter().zip(state.iter()) {
        let len = result.shape()[axis];
        if len > 1 {
            let idx = value.min(len - 1);
            let sliced = result.index_axis(ndarray::Axis(axis), idx);
            result = sliced.to_owned().insert_axis(ndarray::Axis(axis));
        }
    }
    result
}

/// Elementwise product of two same-rank repertoires, broadcasting any axis
/// of length 1 against the other operand's length at that axis.
pub fn broadcast_mul(a: &ArrayD<f64>, b: &ArrayD<f64>) -> ArrayD<f64> {
    assert_eq!(a.ndim(), b.ndim(), "broadcast_mul requires equal-rank arrays");
    let out_shape: Vec<usize> = a
        .shape()
        .iter()
        .zip(b.shape())
        .map(|(&x, &y)| x.max(y))
        .collect();
    let mut out = Array::zeros(IxDyn(&out_shape));
    for (idx, val) in out.indexed_iter_mut() {
        let idx = idx.slice();
        let a_idx: Vec<usize> = idx
            .iter()
            .zip(a.shape())
            .map(|(&i, &s)| if s == 1 { 0 } else { i })
            .collect();
        let b_idx: Vec<usize> = idx
            .iter()
            .zip(b.shape())
            .map(|(&i, &s)| if s == 1 { 0 } else { i })
            .collect();
        *val = a[a_idx.as_slice()] * b[b_idx.as_slice()];
    }
    out
}

/// Flatten a repertoire's probability mass over its purview axes into a
/// `2^|purview|`-length vector, in the state index order of
/// [`crate::combinatorics::state_from_index`] restricted to the purview.
pub fn flatten_over_purview(array: &ArrayD<f64>, purview: &[usize]) -> Vec<f64> {
    let n = purview.len();
    (0..(1usize << n))
        .map(|idx| {
            let bits = crate::combinatorics::state_from_index(idx, n);
            let full_idx: Vec<usize> = (0..array.ndim())
                .map(|axis| {
                    purview
                        .iter()
                        .position(|&p| p == axis)
                        .map(|pos| bits[pos])
                        .unwrap_or(0)
                })
                .collect();
            array[full_idx.as_slice()]
        })
        .collect()
}
