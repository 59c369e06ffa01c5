// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The iterative eigen self-calibration solver.
//!
//! The correlation matrix of a single slice is modelled as g g^H, where g holds
//! the antenna gains. Auto-correlations aren't used, so the matrix diagonal is
//! unknown; it starts at zero and is refined from the leading eigenpair on
//! every iteration. After the last iteration the gains are sqrt(w) v, where w
//! is the largest eigenvalue and v its eigenvector.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::GainCalError;
use crate::{c64, PROGRESS_BARS};

/// The strategy used to eigen-solve correlation matrices. All strategies share
/// the same contract; given the same matrices, their gains agree to within
/// floating-point tolerance.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum SolverDevice {
    /// Slices are solved one after another on a single thread.
    #[default]
    #[strum(serialize = "cpu")]
    #[serde(rename = "cpu")]
    Cpu,

    /// Slices are solved concurrently on the rayon thread pool.
    #[strum(serialize = "cpu-parallel")]
    #[serde(rename = "cpu-parallel")]
    CpuParallel,
}

impl SolverDevice {
    /// Get the [`EigenSolver`] corresponding to this device.
    pub fn solver(self) -> Box<dyn EigenSolver> {
        match self {
            SolverDevice::Cpu => Box::new(EigenSolverCpu),
            SolverDevice::CpuParallel => Box::new(EigenSolverCpuParallel),
        }
    }
}

/// An object that derives per-antenna gains from correlation matrices.
pub trait EigenSolver: Send + Sync {
    /// Solve every correlation matrix in `matrices_saa` ([slice, antenna,
    /// antenna]) with `num_iterations` refinements of the matrix diagonal. The
    /// returned gains are [slice, antenna] and have not been normalised to a
    /// reference antenna.
    ///
    /// # Errors
    ///
    /// This function will return an error if an eigendecomposition fails.
    fn solve(
        &self,
        matrices_saa: ArrayView3<c64>,
        num_iterations: u32,
    ) -> Result<Array2<c64>, GainCalError>;
}

pub struct EigenSolverCpu;

impl EigenSolver for EigenSolverCpu {
    fn solve(
        &self,
        matrices_saa: ArrayView3<c64>,
        num_iterations: u32,
    ) -> Result<Array2<c64>, GainCalError> {
        let (num_slices, num_antennas, _) = matrices_saa.dim();
        let mut gains_sa = Array2::zeros((num_slices, num_antennas));
        let pb = make_solver_progress_bar(num_slices);
        for (i_slice, (matrix, mut gains)) in matrices_saa
            .outer_iter()
            .zip(gains_sa.outer_iter_mut())
            .enumerate()
        {
            gains.assign(&solve_slice(matrix, num_iterations, i_slice)?);
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(gains_sa)
    }
}

pub struct EigenSolverCpuParallel;

impl EigenSolver for EigenSolverCpuParallel {
    fn solve(
        &self,
        matrices_saa: ArrayView3<c64>,
        num_iterations: u32,
    ) -> Result<Array2<c64>, GainCalError> {
        let (num_slices, num_antennas, _) = matrices_saa.dim();
        let mut gains_sa = Array2::zeros((num_slices, num_antennas));
        let pb = make_solver_progress_bar(num_slices);
        matrices_saa
            .outer_iter()
            .into_par_iter()
            .zip(gains_sa.outer_iter_mut())
            .enumerate()
            .try_for_each(|(i_slice, (matrix, mut gains))| {
                gains.assign(&solve_slice(matrix, num_iterations, i_slice)?);
                pb.inc(1);
                Ok::<(), GainCalError>(())
            })?;
        pb.finish_and_clear();
        Ok(gains_sa)
    }
}

/// Solve a single Hermitian correlation matrix. The diagonal of the given
/// matrix is ignored.
pub(super) fn solve_slice(
    matrix: ArrayView2<c64>,
    num_iterations: u32,
    i_slice: usize,
) -> Result<Array1<c64>, GainCalError> {
    let num_antennas = matrix.len_of(Axis(0));
    let mut m = DMatrix::from_fn(num_antennas, num_antennas, |r, c| {
        if r == c {
            c64::default()
        } else {
            matrix[[r, c]]
        }
    });

    let mut gains = Array1::zeros(num_antennas);
    for _ in 0..num_iterations {
        let eigen = SymmetricEigen::try_new(m.clone(), f64::EPSILON, 0)
            .ok_or(GainCalError::EigenFailure { slice: i_slice })?;
        let (i_max, w) = eigen
            .eigenvalues
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or(GainCalError::EigenFailure { slice: i_slice })?;
        let v = eigen.eigenvectors.column(i_max);
        for k in 0..num_antennas {
            m[(k, k)] = c64::new(w * v[k].norm_sqr(), 0.0);
        }

        let sqrt_w = w.sqrt();
        gains
            .iter_mut()
            .zip(v.iter())
            .for_each(|(g, &v)| *g = v * sqrt_w);
    }
    Ok(gains)
}

/// Convenience function to make a progress bar while solving.
fn make_solver_progress_bar(num_slices: usize) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(num_slices as _),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg}: [{wide_bar:.blue}] {pos:3}/{len:3} ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message("Solving gains")
}
