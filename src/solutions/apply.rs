// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Applying gains to visibilities.

use log::warn;
use ndarray::{prelude::*, Zip};

use super::{ApplyError, GainSolution};
use crate::{c64, gaincal::baseline_first_permutation, VisContext};

/// Correct visibilities in place with the inverse of the gains in `solution`.
///
/// The visibilities' baseline axis must be at the position of the solution's
/// antenna axis. Every other axis of the gains must either match the
/// visibilities or have length 1, in which case the gains are broadcast along
/// it. If `phase_only` is true, only the phases of the gains are corrected.
/// Gains that can't be inverted (e.g. zeros) zero the visibilities they touch.
///
/// # Errors
///
/// This function will return an error if the solution's antennas differ from
/// the context's (in any way, including order) or the shapes are
/// incompatible.
pub fn apply_gains(
    vis: ArrayViewMut4<c64>,
    context: &VisContext,
    solution: &GainSolution,
    phase_only: bool,
) -> Result<(), ApplyError> {
    if solution.antennas != context.antennas {
        return Err(ApplyError::AntennaMismatch {
            solution: solution.antennas.to_vec(),
            vis: context.antennas.to_vec(),
        });
    }
    let axis = solution.antenna_axis;
    if axis >= vis.ndim() {
        return Err(ApplyError::BadAntennaAxis {
            solution_axis: axis,
            num_dims: vis.ndim(),
        });
    }
    context.baselines.check_num_baselines(vis.len_of(Axis(axis)))?;
    for (i, (&gains_len, &vis_len)) in solution.gains.shape().iter().zip(vis.shape()).enumerate() {
        let ok = if i == axis {
            gains_len == context.num_antennas()
        } else {
            gains_len == vis_len || gains_len == 1
        };
        if !ok {
            return Err(ApplyError::Shape {
                axis: i,
                gains: gains_len,
                vis: vis_len,
            });
        }
    }

    let mut num_uninvertible = 0;
    let inverse = solution.gains.mapv(|g| {
        let inv = if phase_only { g.norm() / g } else { g.inv() };
        if inv.is_finite() {
            inv
        } else {
            num_uninvertible += 1;
            c64::default()
        }
    });
    if num_uninvertible > 0 {
        warn!("{num_uninvertible} gains could not be inverted; the visibilities they touch are zeroed");
    }

    let perm = baseline_first_permutation(axis);
    let mut vis = vis.permuted_axes(perm);
    let inverse = inverse.permuted_axes(perm);
    for ((a1, a2), mut vis) in context.baselines.iter().zip(vis.outer_iter_mut()) {
        let inv1 = inverse.index_axis(Axis(0), a1);
        let inv2 = inverse.index_axis(Axis(0), a2);
        Zip::from(&mut vis)
            .and_broadcast(&inv1)
            .and_broadcast(&inv2)
            .for_each(|v, &inv1, &inv2| *v *= inv1 * inv2.conj());
    }

    Ok(())
}
