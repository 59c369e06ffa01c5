// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning baseline-indexed visibilities into antenna-correlation matrices.

use ndarray::prelude::*;
use num_traits::Zero;

use crate::{baselines::BaselineIndexTable, c64};

/// Average visibilities jointly over the specified axes, ignoring samples that
/// are exactly zero (e.g. flagged). The averaged axes are kept with length 1.
/// If every sample contributing to an average is zero, the average is zero.
pub fn average_ignoring_zeros(vis: ArrayView4<c64>, axes: &[usize]) -> Array4<c64> {
    let mut sum = vis.to_owned();
    let mut count = vis.mapv(|v| if v.is_zero() { 0.0 } else { 1.0 });
    for &axis in axes {
        sum = sum.sum_axis(Axis(axis)).insert_axis(Axis(axis));
        count = count.sum_axis(Axis(axis)).insert_axis(Axis(axis));
    }

    azip!((s in &mut sum, &c in &count) *s /= if c == 0.0 { 1.0 } else { c });
    sum
}

/// Expand visibilities into Hermitian correlation matrices, one per slice.
///
/// `vis_bs` is [baseline, slice], where the baseline axis follows `baselines`.
/// The returned array is [slice, antenna, antenna]. Element [a1, a2] of a
/// matrix holds the visibility of baseline (a1, a2) and [a2, a1] holds its
/// conjugate. Auto-correlations are ignored, so the diagonal is zero.
pub fn correlation_matrices(
    vis_bs: ArrayView2<c64>,
    baselines: &BaselineIndexTable,
) -> Array3<c64> {
    let num_antennas = baselines.num_antennas();
    let num_slices = vis_bs.len_of(Axis(1));
    let mut matrices = Array3::zeros((num_slices, num_antennas, num_antennas));
    for (i_bl, (a1, a2)) in baselines.cross_baselines() {
        let vis_s = vis_bs.row(i_bl);
        for (mut matrix, &v) in matrices.outer_iter_mut().zip(vis_s.iter()) {
            matrix[[a1, a2]] = v;
            matrix[[a2, a1]] = v.conj();
        }
    }
    matrices
}
