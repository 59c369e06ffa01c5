// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters that drive a whole calibration.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that `cli` is unparsed, user-facing code, whereas parameters have
//! been parsed and are ready to be used directly.

mod calibration;
mod error;
mod simulation;

pub use calibration::{CalibrationOutputs, CalibrationParams};
pub use error::CalibrateError;
pub use simulation::{
    SimulationError, SimulationFiles, SimulationParams, ANTENNA_FLAGS_FILENAME, DELAYS_FILENAME,
    GAINS_FILENAME, REFERENCE_PHASES_FILENAME,
};
