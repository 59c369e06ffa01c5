// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate an observation of antennas with known delays, then calibrate it.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::info;
use thiserror::Error;

use super::{CalibrateError, CalibrationOutputs, CalibrationParams};
use crate::{
    delays::DelayError,
    simulate::{delay_gains, inject_rfi, simulate_vis, SimulateError},
    solutions::SolutionsWriteError,
    VisContext,
};

pub const GAINS_FILENAME: &str = "gains.json";
pub const DELAYS_FILENAME: &str = "residual_delays.csv";
pub const ANTENNA_FLAGS_FILENAME: &str = "antenna_flags.json";
pub const REFERENCE_PHASES_FILENAME: &str = "reference_phases.json";

/// Parameters needed to simulate and calibrate an observation.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub context: VisContext,

    pub num_timesteps: usize,

    /// The delay of each antenna \[ns\].
    pub delays_ns: Vec<f64>,

    /// The gain amplitude of each antenna.
    pub amplitudes: Vec<f64>,

    /// Channels to inject RFI into.
    pub rfi_channels: Vec<usize>,

    pub rfi_amplitude: f64,

    /// The directory that all outputs are written to.
    pub output_dir: PathBuf,

    pub calibration: CalibrationParams,
}

/// The files written by [`SimulationParams::run`].
#[derive(Debug, Clone, Default)]
pub struct SimulationFiles {
    pub gains: PathBuf,
    pub delays: Option<PathBuf>,
    pub antenna_flags: Option<PathBuf>,
    pub reference_phases: PathBuf,
}

impl SimulationParams {
    pub fn run(&self) -> Result<(CalibrationOutputs, SimulationFiles), SimulationError> {
        let context = &self.context;
        let gains = delay_gains(&context.freqs_hz, &self.delays_ns, &self.amplitudes)?;
        let mut vis = simulate_vis(context, gains.view(), self.num_timesteps)?;
        if !self.rfi_channels.is_empty() {
            info!(
                "Injecting RFI with amplitude {} into channels {:?}",
                self.rfi_amplitude, self.rfi_channels
            );
            inject_rfi(vis.view_mut(), &self.rfi_channels, self.rfi_amplitude);
        }

        let outputs = self.calibration.run(vis.view(), context)?;

        let dir = &self.output_dir;
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let mut files = SimulationFiles {
            gains: dir.join(GAINS_FILENAME),
            reference_phases: dir.join(REFERENCE_PHASES_FILENAME),
            ..Default::default()
        };
        outputs.record.write_json(&files.gains)?;
        info!("Wrote gains to {}", files.gains.display());
        outputs.reference_phases.write_json(&files.reference_phases)?;
        info!("Wrote reference phases to {}", files.reference_phases.display());

        if let Some(delays) = outputs.delays.as_ref() {
            let file = dir.join(DELAYS_FILENAME);
            delays.write_csv(&file)?;
            info!("Wrote residual delays to {}", file.display());
            files.delays = Some(file);
        }
        if let Some(flags) = outputs.antenna_flags.as_ref() {
            let file = dir.join(ANTENNA_FLAGS_FILENAME);
            write_json(flags, &file)?;
            info!("Wrote antenna flags to {}", file.display());
            files.antenna_flags = Some(file);
        }

        Ok((outputs, files))
    }
}

fn write_json<T: serde::Serialize>(value: &T, file: &Path) -> Result<(), SimulationError> {
    let writer = BufWriter::new(File::create(file)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Simulate(#[from] SimulateError),

    #[error(transparent)]
    Calibrate(#[from] CalibrateError),

    #[error(transparent)]
    SolutionsWrite(#[from] SolutionsWriteError),

    #[error(transparent)]
    Delay(#[from] DelayError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
