// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fit delays to the phases of gain solutions or reference phases.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;
use indexmap::IndexMap;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    delays::{DelaySolution, PhaseDelayFit},
    solutions::{GainSolutionRecord, ReferencePhases, SolutionsReadError},
    CosmicCalError,
};

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct GainsToDelaysCliArgs {
    /// A gain solution JSON file, or a reference phases JSON file.
    #[clap(short, long, help_heading = "INPUT FILES")]
    pub(super) input: Option<PathBuf>,

    /// Write the fitted delays to this CSV file.
    #[clap(short, long, help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct GainsToDelaysArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "gains-to-delays")]
    #[serde(default)]
    pub(super) args: GainsToDelaysCliArgs,
}

/// The phases that delays were fitted to.
enum PhaseSource {
    Gains(GainSolutionRecord),
    ReferencePhases(ReferencePhases),
}

impl GainsToDelaysArgs {
    pub(super) fn merge(self) -> Result<GainsToDelaysArgs, CosmicCalError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let GainsToDelaysArgs {
                args_file: _,
                args: GainsToDelaysCliArgs { input, output },
            } = unpack_arg_file!(arg_file);

            Ok(GainsToDelaysArgs {
                args_file: None,
                args: GainsToDelaysCliArgs {
                    input: cli_args.args.input.or(input),
                    output: cli_args.args.output.or(output),
                },
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), CosmicCalError> {
        trace!("{:#?}", self);
        let GainsToDelaysArgs {
            args_file: _,
            args: GainsToDelaysCliArgs { input, output },
        } = self;
        let input = input.ok_or(GainsToDelaysArgsError::NoInput)?;
        if !input.exists() {
            return Err(GainsToDelaysArgsError::InputDoesntExist(input).into());
        }

        let source = read_phases(&input)?;
        let mut printer = InfoPrinter::new(format!("Fitting delays to {}", input.display()).into());
        match &source {
            PhaseSource::Gains(record) => {
                printer.push_line("Input: gain solution".into());
                printer.push_line(format!("Reference antenna: {}", record.reference_antenna).into());
                if record.gains.is_empty() {
                    "The gain solution has no antennas".warn();
                }
            }
            PhaseSource::ReferencePhases(_) => {
                printer.push_line("Input: reference phases".into());
            }
        }
        if let Some(output) = output.as_ref() {
            printer.push_line(format!("Writing delays to {}", output.display()).into());
        }
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let solution = fit_delays(&source)?;
        for (antenna, [d0, d1]) in &solution.delays_ns {
            info!("{antenna}: {d0:>10.3} ns {d1:>10.3} ns");
        }
        if let Some(output) = output {
            solution.write_csv(&output)?;
            info!("Wrote delays to {}", output.display());
        }
        Ok(())
    }
}

/// Read either a gain solution or reference phases from a JSON file.
fn read_phases(file: &std::path::Path) -> Result<PhaseSource, CosmicCalError> {
    match GainSolutionRecord::read_json(file) {
        Ok(record) => Ok(PhaseSource::Gains(record)),
        Err(SolutionsReadError::Json(gains_err)) => {
            debug!("{} isn't a gain solution ({gains_err}); trying reference phases", file.display());
            let phases = ReferencePhases::read_json(file)
                .map_err(|e| GainsToDelaysArgsError::UnrecognisedInput {
                    file: file.to_path_buf(),
                    gains_err: gains_err.to_string(),
                    phases_err: e.to_string(),
                })?;
            Ok(PhaseSource::ReferencePhases(phases))
        }
        Err(e) => Err(e.into()),
    }
}

fn fit_delays(source: &PhaseSource) -> Result<DelaySolution, CosmicCalError> {
    let (reference_antenna, fits): (_, IndexMap<String, [PhaseDelayFit; 2]>) = match source {
        PhaseSource::Gains(record) => (Some(record.reference_antenna.clone()), record.phase_delays()?),
        PhaseSource::ReferencePhases(phases) => (None, phases.phase_delays()?),
    };
    Ok(DelaySolution {
        reference_antenna,
        delays_ns: fits
            .into_iter()
            .map(|(antenna, [fit0, fit1])| (antenna, [fit0.delay_ns, fit1.delay_ns]))
            .collect(),
    })
}

#[derive(Error, Debug)]
pub(super) enum GainsToDelaysArgsError {
    #[error("No input file was supplied")]
    NoInput,

    #[error("Input file '{}' doesn't exist", .0.display())]
    InputDoesntExist(PathBuf),

    #[error("'{}' is neither a gain solution ({gains_err}) nor reference phases ({phases_err})", file.display())]
    UnrecognisedInput {
        file: PathBuf,
        gains_err: String,
        phases_err: String,
    },
}
