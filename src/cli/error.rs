// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all cosmic-calib-related errors. This should be the *only*
//! error enum that is publicly visible from the binary.

use thiserror::Error;

use super::{
    common::CalibrateArgsError, fixed_delays_update::FixedDelaysUpdateArgsError,
    gains_to_delays::GainsToDelaysArgsError, simulate::SimulateArgsError,
};
use crate::{
    context::ContextError,
    delays::{DelayError, FixedDelaysError},
    params::{CalibrateError, SimulationError},
    refant::RefAntError,
    simulate::SimulateError,
    solutions::{SolutionsReadError, SolutionsWriteError},
};

/// The *only* publicly visible error from the binary. Each message should be
/// readable without knowing anything about the code.
#[derive(Error, Debug)]
pub enum CosmicCalError {
    /// An error related to simulating an observation.
    #[error("{0}\n\nTry 'cosmic-calib simulate --help' for the simulation options.")]
    Simulate(String),

    /// An error related to calibration.
    #[error("{0}")]
    Calibrate(String),

    /// An error related to gain solution or reference phase files.
    #[error("{0}\n\nGain solutions and reference phases are JSON files written by 'cosmic-calib simulate'.")]
    Solutions(String),

    /// An error related to residual or fixed delays.
    #[error("{0}\n\nDelay files are CSV files; the first column holds antenna labels (e.g. ea05).")]
    Delays(String),

    /// No reference antenna could be chosen.
    #[error("{0}\n\nThe observation can't be calibrated without a reference antenna.")]
    RefAnt(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json files whose tables are named after a subcommand's argument groups.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<CalibrateArgsError> for CosmicCalError {
    fn from(e: CalibrateArgsError) -> Self {
        match e {
            CalibrateArgsError::RefAnt(e) => Self::from(e),
            CalibrateArgsError::BadSolverDevice(_)
            | CalibrateArgsError::BadFlagger(_)
            | CalibrateArgsError::BadThreshold(_)
            | CalibrateArgsError::ZeroIterations => Self::Calibrate(e.to_string()),
        }
    }
}

impl From<SimulateArgsError> for CosmicCalError {
    fn from(e: SimulateArgsError) -> Self {
        match e {
            SimulateArgsError::Context(e) => Self::from(e),
            _ => Self::Simulate(e.to_string()),
        }
    }
}

impl From<GainsToDelaysArgsError> for CosmicCalError {
    fn from(e: GainsToDelaysArgsError) -> Self {
        Self::Solutions(e.to_string())
    }
}

impl From<FixedDelaysUpdateArgsError> for CosmicCalError {
    fn from(e: FixedDelaysUpdateArgsError) -> Self {
        Self::Delays(e.to_string())
    }
}

// Library errors.

impl From<SimulationError> for CosmicCalError {
    fn from(e: SimulationError) -> Self {
        match e {
            SimulationError::Simulate(e) => Self::from(e),
            SimulationError::Calibrate(e) => Self::from(e),
            SimulationError::SolutionsWrite(e) => Self::from(e),
            SimulationError::Delay(e) => Self::from(e),
            SimulationError::Json(_) | SimulationError::IO(_) => Self::Generic(e.to_string()),
        }
    }
}

impl From<SimulateError> for CosmicCalError {
    fn from(e: SimulateError) -> Self {
        Self::Simulate(e.to_string())
    }
}

impl From<CalibrateError> for CosmicCalError {
    fn from(e: CalibrateError) -> Self {
        let s = e.to_string();
        match e {
            CalibrateError::Delay(e) => Self::from(e),
            CalibrateError::SolutionsWrite(e) => Self::from(e),
            CalibrateError::BaselineAxis(_)
            | CalibrateError::Context(_)
            | CalibrateError::GainCal(_)
            | CalibrateError::Grade(_)
            | CalibrateError::Flagging(_)
            | CalibrateError::Phases(_) => Self::Calibrate(s),
        }
    }
}

impl From<ContextError> for CosmicCalError {
    fn from(e: ContextError) -> Self {
        Self::Simulate(e.to_string())
    }
}

impl From<SolutionsReadError> for CosmicCalError {
    fn from(e: SolutionsReadError) -> Self {
        match e {
            SolutionsReadError::IO(e) => Self::from(e),
            _ => Self::Solutions(e.to_string()),
        }
    }
}

impl From<SolutionsWriteError> for CosmicCalError {
    fn from(e: SolutionsWriteError) -> Self {
        match e {
            SolutionsWriteError::IO(e) => Self::from(e),
            _ => Self::Solutions(e.to_string()),
        }
    }
}

impl From<DelayError> for CosmicCalError {
    fn from(e: DelayError) -> Self {
        match e {
            DelayError::IO(e) => Self::from(e),
            _ => Self::Delays(e.to_string()),
        }
    }
}

impl From<FixedDelaysError> for CosmicCalError {
    fn from(e: FixedDelaysError) -> Self {
        match e {
            FixedDelaysError::RefAnt(e) => Self::from(e),
            FixedDelaysError::Delay(e) => Self::from(e),
            FixedDelaysError::IO(e) => Self::from(e),
            _ => Self::Delays(e.to_string()),
        }
    }
}

impl From<RefAntError> for CosmicCalError {
    fn from(e: RefAntError) -> Self {
        Self::RefAnt(e.to_string())
    }
}

impl From<toml::ser::Error> for CosmicCalError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(format!("Couldn't serialise arguments to toml: {e}"))
    }
}

impl From<std::io::Error> for CosmicCalError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
