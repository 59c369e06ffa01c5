// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gain calibration: derive per-antenna complex gains from cross-correlated
//! visibilities.
//!
//! The visibilities are (optionally) averaged, expanded into one correlation
//! matrix per slice (a slice being every combination of the non-baseline
//! axes), eigen-solved and finally normalised so that the reference antenna's
//! phase is zero.

pub(crate) mod correlation;
mod eigen;
mod error;

pub use correlation::{average_ignoring_zeros, correlation_matrices};
pub use eigen::{EigenSolver, EigenSolverCpu, EigenSolverCpuParallel, SolverDevice};
pub use error::GainCalError;

use log::{debug, trace, warn};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{c64, constants::DEFAULT_GAINCAL_ITERATIONS, solutions::GainSolution, VisContext};

/// Parameters of gain calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainCalParams {
    /// The ID of the antenna whose phase is defined to be zero. If it isn't in
    /// the data, the first antenna is used instead.
    pub reference_antenna: u32,

    /// The number of times the correlation-matrix diagonal is refined.
    pub num_iterations: u32,

    /// The position of the baseline axis in the visibilities.
    pub baseline_axis: usize,

    /// Axes to average (ignoring zeros) before solving. The baseline axis can't
    /// be one of them.
    pub average_axes: Vec<usize>,

    /// How the correlation matrices are eigen-solved.
    pub device: SolverDevice,
}

impl Default for GainCalParams {
    fn default() -> Self {
        GainCalParams {
            reference_antenna: 0,
            num_iterations: DEFAULT_GAINCAL_ITERATIONS,
            baseline_axis: 0,
            average_axes: vec![],
            device: SolverDevice::default(),
        }
    }
}

/// Derive reference-normalised antenna gains from visibilities.
///
/// The output gains have the antenna axis where `vis` has its baseline axis;
/// all other axes are unchanged (or length 1, if they were averaged).
///
/// # Errors
///
/// This function will return an error if the number of iterations is zero, an
/// axis is invalid, the baseline axis doesn't match the context's antennas or
/// an eigendecomposition fails.
pub fn gaincal(
    vis: ArrayView4<c64>,
    context: &VisContext,
    params: &GainCalParams,
) -> Result<GainSolution, GainCalError> {
    if params.num_iterations == 0 {
        return Err(GainCalError::ZeroIterations);
    }
    let num_dims = vis.ndim();
    for &axis in std::iter::once(&params.baseline_axis).chain(params.average_axes.iter()) {
        if axis >= num_dims {
            return Err(GainCalError::BadAxis { axis, num_dims });
        }
    }
    if params.average_axes.contains(&params.baseline_axis) {
        return Err(GainCalError::AveragedBaselineAxis(params.baseline_axis));
    }
    if params.baseline_axis == 0 {
        context.validate_vis(vis)?;
    } else {
        context
            .baselines
            .check_num_baselines(vis.len_of(Axis(params.baseline_axis)))?;
    }

    let averaged = if params.average_axes.is_empty() {
        None
    } else {
        debug!("Averaging visibilities over axes {:?}", params.average_axes);
        Some(average_ignoring_zeros(vis, &params.average_axes))
    };
    let vis = match averaged.as_ref() {
        Some(a) => a.view(),
        None => vis.view(),
    };

    // Bring the baseline axis to the front, and flatten the rest into slices.
    let perm = baseline_first_permutation(params.baseline_axis);
    let vis_b_rest = vis.permuted_axes(perm);
    let rest_shape = [
        vis_b_rest.len_of(Axis(1)),
        vis_b_rest.len_of(Axis(2)),
        vis_b_rest.len_of(Axis(3)),
    ];
    let num_baselines = vis_b_rest.len_of(Axis(0));
    let num_slices = rest_shape.iter().product::<usize>();
    let vis_bs = vis_b_rest.to_shape((num_baselines, num_slices))?;
    trace!("Solving {num_slices} slices with the {} solver", params.device);

    let matrices_saa = correlation_matrices(vis_bs.view(), &context.baselines);
    let mut gains_sa = params
        .device
        .solver()
        .solve(matrices_saa.view(), params.num_iterations)?;

    let reference_antenna = normalise_to_reference(gains_sa.view_mut(), context, params.reference_antenna);

    // Undo the flattening and the permutation.
    let num_antennas = context.num_antennas();
    let gains_a_rest = gains_sa
        .reversed_axes()
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((num_antennas, rest_shape[0], rest_shape[1], rest_shape[2]))?;
    let gains = gains_a_rest
        .permuted_axes(inverse_permutation(perm))
        .as_standard_layout()
        .into_owned();

    Ok(GainSolution {
        antennas: context.antennas.clone(),
        reference_antenna,
        antenna_axis: params.baseline_axis,
        gains,
    })
}

/// Rotate the gains of every slice so that the reference antenna's phase is
/// zero. If the reference antenna isn't present, the first antenna is used.
/// The ID of the antenna actually used is returned.
///
/// A reference with zero amplitude can't define a phase, so the gains of such
/// a slice are all zeroed.
pub(crate) fn normalise_to_reference(
    mut gains_sa: ArrayViewMut2<c64>,
    context: &VisContext,
    reference_antenna: u32,
) -> u32 {
    let (i_ref, reference_antenna) = match context.antenna_index(reference_antenna) {
        Some(i) => (i, reference_antenna),
        None => {
            let first = *context.antennas.first();
            warn!("Reference antenna {reference_antenna} is not in the data; using antenna {first} instead");
            (0, first)
        }
    };

    let mut num_zeroed = 0;
    for mut gains in gains_sa.outer_iter_mut() {
        let g_ref = gains[i_ref];
        let amp = g_ref.norm();
        let factor = if amp > 0.0 {
            let phase = g_ref.arg();
            c64::new(phase.cos(), -phase.sin())
        } else {
            num_zeroed += 1;
            c64::default()
        };
        gains.mapv_inplace(|g| g * factor);
        // The reference phase is zero by definition, so don't let rounding
        // leave anything in the imaginary part.
        gains[i_ref] = c64::new(amp * factor.norm(), 0.0);
    }
    if num_zeroed > 0 {
        warn!("The reference antenna's gain was zero in {num_zeroed} slices; all gains of these slices are zero");
    }

    reference_antenna
}

/// The axis permutation that moves `baseline_axis` to the front, keeping the
/// order of the other axes.
pub(crate) fn baseline_first_permutation(baseline_axis: usize) -> [usize; 4] {
    let mut perm = [0; 4];
    perm[0] = baseline_axis;
    for (p, axis) in perm[1..]
        .iter_mut()
        .zip((0..4).filter(|&a| a != baseline_axis))
    {
        *p = axis;
    }
    perm
}

fn inverse_permutation(perm: [usize; 4]) -> [usize; 4] {
    let mut inverse = [0; 4];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}
