// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with gain solutions.

use thiserror::Error;

use crate::{baselines::BaselineError, context::ContextError, gaincal::GainCalError};

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("The gain solution's antennas {solution:?} don't match the visibilities' antennas {vis:?}")]
    AntennaMismatch { solution: Vec<u32>, vis: Vec<u32> },

    #[error("The gain solution has its antenna axis at position {solution_axis}, but the visibilities only have {num_dims} dimensions")]
    BadAntennaAxis {
        solution_axis: usize,
        num_dims: usize,
    },

    #[error("Axis {axis} of the gains has length {gains}, which can't be applied to visibilities with length {vis} on the same axis")]
    Shape {
        axis: usize,
        gains: usize,
        vis: usize,
    },

    #[error(transparent)]
    Baseline(#[from] BaselineError),
}

#[derive(Error, Debug)]
pub enum GradeError {
    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    GainCal(#[from] GainCalError),
}

#[derive(Error, Debug)]
pub enum PhasesError {
    #[error("Reference antenna {0} is not in the visibilities")]
    MissingReference(u32),

    #[error(transparent)]
    Context(#[from] ContextError),
}

#[derive(Error, Debug)]
pub enum SolutionsWriteError {
    #[error("Gain solution records need the antenna axis first, but it is at position {0}")]
    AntennaAxis(usize),

    #[error("The gains have {gains} channels, but {freqs} frequencies were given")]
    ChannelMismatch { gains: usize, freqs: usize },

    #[error("The gains have {got} polarisations, but {expected} are required")]
    PolMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SolutionsReadError {
    #[error("Antenna {antenna} has {got} gain values in '{field}', but there are {expected} frequencies")]
    BadShape {
        antenna: String,
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("There are {antennas} antennas, but '{field}' has {rows} rows")]
    NumRows {
        field: &'static str,
        antennas: usize,
        rows: usize,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
