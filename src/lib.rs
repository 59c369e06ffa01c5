// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Self-calibration software for multi-antenna radio interferometers.
//!
//! Per-antenna complex gains are derived from cross-correlated visibilities
//! with an iterative eigen-decomposition, per-antenna residual delays come
//! from an FFT peak search, and narrowband RFI can be flagged with a sliding
//! robust-statistics window before either is derived.

pub mod baselines;
mod cli;
pub mod constants;
pub mod context;
pub mod delays;
pub mod flagging;
pub mod gaincal;
pub(crate) mod math;
pub mod params;
pub mod refant;
pub mod simulate;
pub mod solutions;

#[cfg(test)]
mod tests;

use crossbeam_utils::atomic::AtomicCell;

/// A complex number with double-precision floats. This is the sample type of
/// all visibilities and gains.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex64;

/// Should we draw progress bars? Only the binary should set this.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);

// Re-exports.
pub use baselines::BaselineIndexTable;
pub use cli::{CosmicCal, CosmicCalError};
pub use context::VisContext;
pub use delays::{DelayEstimator, DelaySolution, FixedDelays};
pub use flagging::{AntennaFlags, RfiFlagger, RfiFlaggerType, RfiFlags};
pub use gaincal::{gaincal, GainCalParams, SolverDevice};
pub use params::{CalibrationOutputs, CalibrationParams};
pub use refant::select_reference_antenna;
pub use solutions::{apply_gains, propose_grade, GainSolution, GainSolutionRecord};
