// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with gain calibration.

use thiserror::Error;

use crate::{baselines::BaselineError, context::ContextError};

#[derive(Error, Debug)]
pub enum GainCalError {
    #[error("The number of solver iterations must be at least 1")]
    ZeroIterations,

    #[error("Axis {axis} was specified, but the visibilities only have {num_dims} dimensions")]
    BadAxis { axis: usize, num_dims: usize },

    #[error("The baseline axis ({0}) cannot also be averaged")]
    AveragedBaselineAxis(usize),

    #[error("The eigendecomposition of the correlation matrix of slice {slice} did not converge")]
    EigenFailure { slice: usize },

    #[error(transparent)]
    Baseline(#[from] BaselineError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
