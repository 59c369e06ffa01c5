// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. e.g. the calibration options
//! of `simulate` are shared with anything else that calibrates, and all
//! subcommands can read their arguments from a file.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::str::FromStr;

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    constants::{DEFAULT_GAINCAL_ITERATIONS, DEFAULT_RFI_THRESHOLD},
    flagging::{RfiFlagger, RfiFlaggerType},
    gaincal::{GainCalParams, SolverDevice},
    refant::{select_reference_antenna, RefAntError},
    CalibrationParams,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref NUM_ITERATIONS_HELP: String =
        format!("The number of times the correlation-matrix diagonal is refined when solving for gains. Default: {DEFAULT_GAINCAL_ITERATIONS}");

    static ref SOLVER_HELP: String =
        format!("How correlation matrices are eigen-solved. Supported: {}. Default: {}", SolverDevice::iter().join(", "), SolverDevice::default());

    static ref FLAGGER_HELP: String =
        format!("The RFI flagger to use. Supported: {}. Default: {}", RfiFlaggerType::iter().join(", "), RfiFlaggerType::default());

    static ref RFI_THRESHOLD_HELP: String =
        format!("Flag channels more than this many median absolute deviations from the flagger's model of the spectrum. Default: {DEFAULT_RFI_THRESHOLD}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(CosmicCalError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(CosmicCalError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(CosmicCalError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Arguments controlling how visibilities are calibrated.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct CalibrateArgs {
    /// The ID of the reference antenna, whose gain phase is defined to be zero.
    /// If this isn't given, the first candidate of --ref-priority that was
    /// observed is used, or failing that, the first antenna.
    #[clap(short, long, help_heading = "CALIBRATION")]
    pub(super) reference_antenna: Option<u32>,

    /// Candidate reference antennas in order of preference.
    #[clap(long, multiple_values(true), help_heading = "CALIBRATION")]
    pub(super) ref_priority: Option<Vec<u32>>,

    /// Antennas that must never be the reference antenna (e.g. because they're
    /// known to be bad).
    #[clap(long, multiple_values(true), help_heading = "CALIBRATION")]
    pub(super) ref_exclusions: Option<Vec<u32>>,

    #[clap(long, help = NUM_ITERATIONS_HELP.as_str(), help_heading = "CALIBRATION")]
    pub(super) num_iterations: Option<u32>,

    #[clap(long, help = SOLVER_HELP.as_str(), help_heading = "CALIBRATION")]
    pub(super) solver: Option<String>,

    /// Average visibilities over time before solving, so that one set of gains
    /// is derived for all timesteps.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) time_average: bool,

    /// Re-derive gains after applying the solution, and grade them.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) propose_grade: bool,

    /// Don't estimate residual delays.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) no_delays: bool,

    #[clap(long, help = FLAGGER_HELP.as_str(), help_heading = "RFI FLAGGING")]
    pub(super) flagger: Option<String>,

    #[clap(long, help = RFI_THRESHOLD_HELP.as_str(), help_heading = "RFI FLAGGING")]
    pub(super) rfi_threshold: Option<f64>,

    /// Don't flag RFI before calibrating.
    #[clap(long, help_heading = "RFI FLAGGING")]
    #[serde(default)]
    pub(super) no_rfi_flagging: bool,
}

impl CalibrateArgs {
    /// Merge two sets of arguments. Where both specify something, `self` is
    /// preferred.
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            reference_antenna: self.reference_antenna.or(other.reference_antenna),
            ref_priority: self.ref_priority.or(other.ref_priority),
            ref_exclusions: self.ref_exclusions.or(other.ref_exclusions),
            num_iterations: self.num_iterations.or(other.num_iterations),
            solver: self.solver.or(other.solver),
            time_average: self.time_average || other.time_average,
            propose_grade: self.propose_grade || other.propose_grade,
            no_delays: self.no_delays || other.no_delays,
            flagger: self.flagger.or(other.flagger),
            rfi_threshold: self.rfi_threshold.or(other.rfi_threshold),
            no_rfi_flagging: self.no_rfi_flagging || other.no_rfi_flagging,
        }
    }

    /// Turn the arguments into [`CalibrationParams`] for the observed antennas
    /// `antennas`. Information on the choices made is pushed onto `printer`.
    pub(super) fn parse(
        self,
        antennas: &[u32],
        printer: &mut InfoPrinter,
    ) -> Result<CalibrationParams, CalibrateArgsError> {
        let CalibrateArgs {
            reference_antenna,
            ref_priority,
            ref_exclusions,
            num_iterations,
            solver,
            time_average,
            propose_grade,
            no_delays,
            flagger,
            rfi_threshold,
            no_rfi_flagging,
        } = self;

        let exclusions = ref_exclusions.unwrap_or_default();
        let reference_antenna = match (reference_antenna, ref_priority) {
            (Some(r), _) => {
                if exclusions.contains(&r) {
                    format!("Reference antenna {r} was explicitly chosen, but it is also excluded")
                        .warn();
                }
                r
            }
            (None, Some(priority)) => select_reference_antenna(&priority, &exclusions, antennas)?,
            (None, None) => antennas.first().copied().unwrap_or_default(),
        };
        printer.push_line(format!("Reference antenna: {reference_antenna}").into());

        let num_iterations = num_iterations.unwrap_or(DEFAULT_GAINCAL_ITERATIONS);
        if num_iterations == 0 {
            return Err(CalibrateArgsError::ZeroIterations);
        }
        let device = match solver {
            Some(s) => SolverDevice::from_str(&s).map_err(|_| CalibrateArgsError::BadSolverDevice(s))?,
            None => SolverDevice::default(),
        };
        printer.push_line(format!("Solving with {num_iterations} iterations on device {device}").into());

        let flagger = if no_rfi_flagging {
            if flagger.is_some() || rfi_threshold.is_some() {
                "RFI flagging options were given, but RFI flagging is disabled".warn();
            }
            printer.push_line("No RFI flagging".into());
            None
        } else {
            let kind = match flagger {
                Some(f) => RfiFlaggerType::from_str(&f).map_err(|_| CalibrateArgsError::BadFlagger(f))?,
                None => RfiFlaggerType::default(),
            };
            let threshold = rfi_threshold.unwrap_or(DEFAULT_RFI_THRESHOLD);
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(CalibrateArgsError::BadThreshold(threshold));
            }
            printer.push_line(format!("RFI flagger: {kind} (threshold {threshold})").into());
            Some(RfiFlagger { kind, threshold })
        };

        debug!("Time averaging before solving: {time_average}");
        Ok(CalibrationParams {
            propose_grade,
            estimate_delays: !no_delays,
            gaincal: GainCalParams {
                reference_antenna,
                num_iterations,
                baseline_axis: 0,
                average_axes: if time_average { vec![1] } else { vec![] },
                device,
            },
            flagger,
        })
    }
}

#[derive(Error, Debug)]
pub(super) enum CalibrateArgsError {
    #[error("Unrecognised solver device '{0}'. Supported: {}", SolverDevice::iter().join(", "))]
    BadSolverDevice(String),

    #[error("Unrecognised RFI flagger '{0}'. Supported: {}", RfiFlaggerType::iter().join(", "))]
    BadFlagger(String),

    #[error("The RFI threshold must be a positive number, but got {0}")]
    BadThreshold(f64),

    #[error("The number of solver iterations cannot be 0")]
    ZeroIterations,

    #[error(transparent)]
    RefAnt(#[from] RefAntError),
}
