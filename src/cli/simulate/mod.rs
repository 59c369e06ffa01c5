// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate an observation of antennas with known delays and calibrate it.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vec1::Vec1;

use super::common::{display_warnings, CalibrateArgs, InfoPrinter, ARG_FILE_HELP};
use crate::{
    context::ContextError, params::SimulationParams, CosmicCalError, VisContext,
};

const DEFAULT_NUM_ANTENNAS: usize = 4;
const DEFAULT_NUM_CHANNELS: usize = 64;
const DEFAULT_NUM_TIMESTEPS: usize = 2;
const DEFAULT_CHANNEL_WIDTH_KHZ: f64 = 1000.0;
const DEFAULT_START_FREQ_MHZ: f64 = 1000.0;
const DEFAULT_INTEGRATION_TIME_S: f64 = 1.0;
const DEFAULT_RFI_AMPLITUDE: f64 = 50.0;

lazy_static::lazy_static! {
    static ref NUM_ANTENNAS_HELP: String =
        format!("The number of antennas, with IDs starting at 0. Ignored if --antennas is given. Default: {DEFAULT_NUM_ANTENNAS}");

    static ref NUM_CHANNELS_HELP: String =
        format!("The number of channels. Default: {DEFAULT_NUM_CHANNELS}");

    static ref NUM_TIMESTEPS_HELP: String =
        format!("The number of timesteps. Default: {DEFAULT_NUM_TIMESTEPS}");

    static ref CHANNEL_WIDTH_HELP: String =
        format!("The width of each channel [kHz]. Default: {DEFAULT_CHANNEL_WIDTH_KHZ}");

    static ref START_FREQ_HELP: String =
        format!("The centre frequency of the first channel [MHz]. Default: {DEFAULT_START_FREQ_MHZ}");

    static ref INTEGRATION_TIME_HELP: String =
        format!("The duration of each timestep [seconds]. Default: {DEFAULT_INTEGRATION_TIME_S}");

    static ref RFI_AMPLITUDE_HELP: String =
        format!("The amplitude of injected RFI. Default: {DEFAULT_RFI_AMPLITUDE}");
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct SimulateCliArgs {
    #[clap(short = 'n', long, help = NUM_ANTENNAS_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) num_antennas: Option<usize>,

    /// The IDs of the antennas.
    #[clap(long, multiple_values(true), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) antennas: Option<Vec<u32>>,

    #[clap(short = 'c', long, help = NUM_CHANNELS_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) num_channels: Option<usize>,

    #[clap(short = 't', long, help = NUM_TIMESTEPS_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) num_timesteps: Option<usize>,

    #[clap(long, help = CHANNEL_WIDTH_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) channel_width: Option<f64>,

    #[clap(long, help = START_FREQ_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) start_freq: Option<f64>,

    #[clap(long, help = INTEGRATION_TIME_HELP.as_str(), help_heading = "OBSERVATION PARAMETERS")]
    pub(super) integration_time: Option<f64>,

    /// The delay of each antenna [ns], separated by commas (e.g.
    /// --delays=0,-20,35). Default: all 0.
    #[clap(
        long,
        use_value_delimiter = true,
        allow_hyphen_values = true,
        help_heading = "ANTENNA MODEL"
    )]
    pub(super) delays: Option<Vec<f64>>,

    /// The gain amplitude of each antenna, separated by commas. Default: all
    /// 1.
    #[clap(long, use_value_delimiter = true, help_heading = "ANTENNA MODEL")]
    pub(super) amplitudes: Option<Vec<f64>>,

    /// Channels to inject RFI into.
    #[clap(long, multiple_values(true), help_heading = "RFI")]
    pub(super) rfi_channels: Option<Vec<usize>>,

    #[clap(long, help = RFI_AMPLITUDE_HELP.as_str(), help_heading = "RFI")]
    pub(super) rfi_amplitude: Option<f64>,

    /// The directory to write gains, delays, flags and phases into. Default:
    /// the current directory.
    #[clap(short = 'o', long, help_heading = "OUTPUT FILES")]
    pub(super) output_dir: Option<PathBuf>,
}

impl SimulateCliArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            num_antennas: self.num_antennas.or(other.num_antennas),
            antennas: self.antennas.or(other.antennas),
            num_channels: self.num_channels.or(other.num_channels),
            num_timesteps: self.num_timesteps.or(other.num_timesteps),
            channel_width: self.channel_width.or(other.channel_width),
            start_freq: self.start_freq.or(other.start_freq),
            integration_time: self.integration_time.or(other.integration_time),
            delays: self.delays.or(other.delays),
            amplitudes: self.amplitudes.or(other.amplitudes),
            rfi_channels: self.rfi_channels.or(other.rfi_channels),
            rfi_amplitude: self.rfi_amplitude.or(other.rfi_amplitude),
            output_dir: self.output_dir.or(other.output_dir),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct SimulateArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "simulate")]
    #[serde(default)]
    pub(super) simulate_args: SimulateCliArgs,

    #[clap(flatten)]
    #[serde(rename = "calibrate")]
    #[serde(default)]
    pub(super) calibrate_args: CalibrateArgs,
}

impl SimulateArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<SimulateArgs, CosmicCalError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let SimulateArgs {
                args_file: _,
                simulate_args,
                calibrate_args,
            } = unpack_arg_file!(arg_file);

            Ok(SimulateArgs {
                args_file: None,
                simulate_args: cli_args.simulate_args.merge(simulate_args),
                calibrate_args: cli_args.calibrate_args.merge(calibrate_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<SimulationParams, CosmicCalError> {
        debug!("{:#?}", self);

        // Expose all the struct fields to ensure they're all used.
        let SimulateArgs {
            args_file: _,
            simulate_args:
                SimulateCliArgs {
                    num_antennas,
                    antennas,
                    num_channels,
                    num_timesteps,
                    channel_width,
                    start_freq,
                    integration_time,
                    delays,
                    amplitudes,
                    rfi_channels,
                    rfi_amplitude,
                    output_dir,
                },
            calibrate_args,
        } = self;

        let antennas = match antennas {
            Some(a) => a,
            None => (0..num_antennas.unwrap_or(DEFAULT_NUM_ANTENNAS) as u32).collect(),
        };
        let antennas = Vec1::try_from_vec(antennas).map_err(|_| SimulateArgsError::NoAntennas)?;
        let num_antennas = antennas.len();

        let num_channels = num_channels.unwrap_or(DEFAULT_NUM_CHANNELS);
        let channel_width_hz = channel_width.unwrap_or(DEFAULT_CHANNEL_WIDTH_KHZ) * 1e3;
        let start_freq_hz = start_freq.unwrap_or(DEFAULT_START_FREQ_MHZ) * 1e6;
        let freqs_hz = Vec1::try_from_vec(
            (0..num_channels)
                .map(|i| start_freq_hz + i as f64 * channel_width_hz)
                .collect(),
        )
        .map_err(|_| SimulateArgsError::NoChannels)?;

        let num_timesteps = num_timesteps.unwrap_or(DEFAULT_NUM_TIMESTEPS);
        if num_timesteps == 0 {
            return Err(SimulateArgsError::NoTimesteps.into());
        }
        let integration_time_s = integration_time.unwrap_or(DEFAULT_INTEGRATION_TIME_S);

        let delays_ns = delays.unwrap_or_else(|| vec![0.0; num_antennas]);
        if delays_ns.len() != num_antennas {
            return Err(SimulateArgsError::ModelLength {
                what: "delays",
                got: delays_ns.len(),
                expected: num_antennas,
            }
            .into());
        }
        let amplitudes = amplitudes.unwrap_or_else(|| vec![1.0; num_antennas]);
        if amplitudes.len() != num_antennas {
            return Err(SimulateArgsError::ModelLength {
                what: "amplitudes",
                got: amplitudes.len(),
                expected: num_antennas,
            }
            .into());
        }

        let context = VisContext::new(antennas, freqs_hz, channel_width_hz, integration_time_s)
            .map_err(SimulateArgsError::from)?;

        let mut obs_printer = InfoPrinter::new("Simulated observation".into());
        obs_printer.push_block(vec![
            format!("{num_antennas} antennas ({} baselines)", context.baselines.len()).into(),
            format!("Antenna IDs: {:?}", context.antennas.as_vec()).into(),
        ]);
        obs_printer.push_block(vec![
            format!(
                "{num_channels} channels of {:.3} kHz",
                channel_width_hz / 1e3
            )
            .into(),
            format!("First channel: {:.3} MHz", *context.freqs_hz.first() / 1e6).into(),
            format!("Last channel:  {:.3} MHz", *context.freqs_hz.last() / 1e6).into(),
        ]);
        obs_printer.push_line(
            format!("{num_timesteps} timesteps of {integration_time_s} s").into(),
        );
        obs_printer.push_block(
            context
                .antennas
                .iter()
                .zip(delays_ns.iter().zip(amplitudes.iter()))
                .map(|(a, (d, amp))| {
                    format!("{}: {d} ns, amplitude {amp}", VisContext::antenna_label(*a)).into()
                })
                .collect(),
        );
        let rfi_channels = rfi_channels.unwrap_or_default();
        let rfi_amplitude = rfi_amplitude.unwrap_or(DEFAULT_RFI_AMPLITUDE);
        if !rfi_channels.is_empty() {
            obs_printer.push_line(
                format!("RFI of amplitude {rfi_amplitude} in channels {rfi_channels:?}").into(),
            );
        }
        obs_printer.display();

        let mut cal_printer = InfoPrinter::new("Calibration".into());
        let calibration = calibrate_args.parse(context.antennas.as_slice(), &mut cal_printer)?;
        cal_printer.display();

        let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("."));
        let mut output_printer = InfoPrinter::new("Outputs".into());
        output_printer.push_line(format!("Writing to {}", output_dir.display()).into());
        output_printer.display();

        display_warnings();

        Ok(SimulationParams {
            context,
            num_timesteps,
            delays_ns,
            amplitudes,
            rfi_channels,
            rfi_amplitude,
            output_dir,
            calibration,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), CosmicCalError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let (outputs, _) = params.run()?;
        info!("Solution grade: {}", outputs.solution.grade());
        if let Some(proposed) = outputs.record.proposed_grade {
            info!("Proposed grade: {proposed}");
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum SimulateArgsError {
    #[error("No antennas were specified")]
    NoAntennas,

    #[error("The number of channels cannot be 0")]
    NoChannels,

    #[error("The number of timesteps cannot be 0")]
    NoTimesteps,

    #[error("{got} {what} were given, but there are {expected} antennas")]
    ModelLength {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error(transparent)]
    Context(#[from] ContextError),
}
