// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with delays.

use std::path::PathBuf;

use thiserror::Error;

use crate::{context::ContextError, refant::RefAntError};

#[derive(Error, Debug)]
pub enum DelayError {
    #[error("The channel width must be positive and finite, but got {0} Hz")]
    BadChannelWidth(f64),

    #[error("Reference antenna {0} is not in the visibilities")]
    MissingReference(u32),

    #[error("Expected delays for {expected} baselines, but got {got}")]
    NumBaselines { expected: usize, got: usize },

    #[error("Fitting a delay needs at least two channels with distinct frequencies, but got {0} channels")]
    TooFewChannels(usize),

    #[error("Line {line} of the delay file has an invalid antenna label '{label}'")]
    BadLabel { line: u64, label: String },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FixedDelaysError {
    #[error("No antenna in the fixed delays has all-zero delays, so the reference antenna can't be determined")]
    NoReference,

    #[error("Antennas {0:?} all have all-zero fixed delays, so the reference antenna is ambiguous")]
    AmbiguousReference(Vec<String>),

    #[error("Antenna '{0}' is not in the fixed delays")]
    MissingAntenna(String),

    #[error("Fixed-delay line {line} has {got} delays, but 4 (IF0 to IF3) are required")]
    BadRow { line: u64, got: usize },

    #[error("Fixed-delay line {line} has an invalid delay '{value}'")]
    BadValue { line: u64, value: String },

    #[error("Neither AC nor BD residual delays were given")]
    NoResiduals,

    #[error("Cannot write next to {0}; it has no parent directory")]
    NoParent(PathBuf),

    #[error(transparent)]
    RefAnt(#[from] RefAntError),

    #[error(transparent)]
    Delay(#[from] DelayError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
