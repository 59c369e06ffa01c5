// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Apply residual delays to a fixed-delay table.


use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    delays::{update_fixed_delays, DelaySolution, FixedDelays},
    CosmicCalError,
};

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct FixedDelaysUpdateCliArgs {
    /// The fixed-delay table to update (header ",IF0,IF1,IF2,IF3"). The new
    /// table is written to the same directory.
    #[clap(short, long, help_heading = "INPUT FILES")]
    pub(super) fixed_delays: Option<PathBuf>,

    /// Residual delays of the AC tuning; applied to IF0 and IF1.
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) ac: Option<PathBuf>,

    /// Residual delays of the BD tuning; applied to IF2 and IF3.
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) bd: Option<PathBuf>,

    /// The IDs of the antennas in the observation. If the table's reference
    /// antenna isn't one of them, the table is re-referenced first.
    #[clap(long, multiple_values(true), help_heading = "REFERENCE ANTENNA")]
    pub(super) observed: Option<Vec<u32>>,

    /// Reference antenna IDs in order of preference, used when re-referencing.
    #[clap(long, multiple_values(true), help_heading = "REFERENCE ANTENNA")]
    pub(super) priority: Option<Vec<u32>>,

    /// Antenna IDs that must not become the reference antenna.
    #[clap(long, multiple_values(true), help_heading = "REFERENCE ANTENNA")]
    pub(super) exclusions: Option<Vec<u32>>,
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct FixedDelaysUpdateArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "fixed-delays-update")]
    #[serde(default)]
    pub(super) args: FixedDelaysUpdateCliArgs,
}

impl FixedDelaysUpdateArgs {
    pub(super) fn merge(self) -> Result<FixedDelaysUpdateArgs, CosmicCalError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let FixedDelaysUpdateArgs {
                args_file: _,
                args:
                    FixedDelaysUpdateCliArgs {
                        fixed_delays,
                        ac,
                        bd,
                        observed,
                        priority,
                        exclusions,
                    },
            } = unpack_arg_file!(arg_file);

            let cli = cli_args.args;
            Ok(FixedDelaysUpdateArgs {
                args_file: None,
                args: FixedDelaysUpdateCliArgs {
                    fixed_delays: cli.fixed_delays.or(fixed_delays),
                    ac: cli.ac.or(ac),
                    bd: cli.bd.or(bd),
                    observed: cli.observed.or(observed),
                    priority: cli.priority.or(priority),
                    exclusions: cli.exclusions.or(exclusions),
                },
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), CosmicCalError> {
        trace!("{:#?}", self);
        let FixedDelaysUpdateArgs {
            args_file: _,
            args:
                FixedDelaysUpdateCliArgs {
                    fixed_delays,
                    ac,
                    bd,
                    observed,
                    priority,
                    exclusions,
                },
        } = self;

        let fixed_delays = fixed_delays.ok_or(FixedDelaysUpdateArgsError::NoFixedDelays)?;
        if ac.is_none() && bd.is_none() {
            return Err(FixedDelaysUpdateArgsError::NoResiduals.into());
        }
        for file in [Some(&fixed_delays), ac.as_ref(), bd.as_ref()].into_iter().flatten() {
            if !file.exists() {
                return Err(FixedDelaysUpdateArgsError::DoesntExist(file.clone()).into());
            }
        }
        let observed = observed.unwrap_or_default();
        let priority = priority.unwrap_or_default();
        let exclusions = exclusions.unwrap_or_default();

        let table = FixedDelays::read_csv(&fixed_delays)?;
        let reference = table.find_reference()?;
        let read = |file: &Option<PathBuf>| file.as_ref().map(DelaySolution::read_csv).transpose();
        let ac_delays = read(&ac)?;
        let bd_delays = read(&bd)?;

        let mut printer = InfoPrinter::new(
            format!("Updating fixed delays {}", fixed_delays.display()).into(),
        );
        printer.push_block(vec![
            format!("Antennas: {}", table.delays_ns.len()).into(),
            format!("Reference antenna: {reference}").into(),
        ]);
        let mut residuals = vec![];
        for (tuning, file, delays) in [("AC", &ac, &ac_delays), ("BD", &bd, &bd_delays)] {
            if let (Some(file), Some(delays)) = (file, delays) {
                residuals.push(
                    format!(
                        "{tuning}: {} ({} antennas)",
                        file.display(),
                        delays.delays_ns.len()
                    )
                    .into(),
                );
                let unknown = delays
                    .delays_ns
                    .keys()
                    .filter(|a| !table.delays_ns.contains_key(*a))
                    .collect::<Vec<_>>();
                if !unknown.is_empty() {
                    format!(
                        "{tuning} residuals of antennas {} have no fixed delays and will be ignored",
                        unknown.iter().join(", ")
                    )
                    .warn();
                }
            }
        }
        printer.push_block(residuals);
        if !observed.is_empty() {
            printer.push_block(vec![
                format!("Observed antennas: {observed:?}").into(),
                format!("Reference priority: {priority:?}").into(),
                format!("Reference exclusions: {exclusions:?}").into(),
            ]);
        } else if !priority.is_empty() || !exclusions.is_empty() {
            "No observed antennas were given; the reference priority list is unused".warn();
        }
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let update = update_fixed_delays(
            &fixed_delays,
            ac_delays.as_ref(),
            bd_delays.as_ref(),
            &observed,
            &priority,
            &exclusions,
        )?;
        info!(
            "New fixed delays (reference {}): {}",
            update.reference_antenna,
            update.output.display()
        );
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum FixedDelaysUpdateArgsError {
    #[error("No fixed-delay table was supplied")]
    NoFixedDelays,

    #[error("No residual delays were supplied; use --ac and/or --bd")]
    NoResiduals,

    #[error("File '{}' doesn't exist", .0.display())]
    DoesntExist(PathBuf),
}
