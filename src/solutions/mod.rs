// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gain solutions: their application, grading and interchange.

mod apply;
mod error;
mod grade;
mod phases;

pub use apply::apply_gains;
pub use error::*;
pub use grade::{grade_gains, propose_grade};
pub use phases::{reference_phases, ReferencePhases};

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use indexmap::IndexMap;
use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use crate::{
    c64,
    constants::{NUM_POLS, POL_INDICES, UNGRADABLE},
    delays::{fit_phase_delay, DelayError, PhaseDelayFit},
    gaincal::average_ignoring_zeros,
    VisContext,
};

/// The result of gain calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct GainSolution {
    /// The IDs of the antennas, in the same order as the gains' antenna axis.
    pub antennas: Vec1<u32>,

    /// The ID of the reference antenna used. This may not be the requested
    /// reference antenna, if that antenna wasn't available.
    pub reference_antenna: u32,

    /// The position of the antenna axis in `gains`. This is the position that
    /// the baseline axis had in the calibrated visibilities.
    pub antenna_axis: usize,

    /// The gains. The phase of the reference antenna is zero in every slice.
    /// Typically [antenna, time, channel, polarisation].
    pub gains: Array4<c64>,
}

impl GainSolution {
    pub fn num_antennas(&self) -> usize {
        self.antennas.len()
    }

    /// The grade of every slice of the gains (i.e. the gains are graded along
    /// the antenna axis).
    pub fn grades(&self) -> Array3<f64> {
        self.gains
            .map_axis(Axis(self.antenna_axis), grade_gains)
    }

    /// The mean of the gradable slice grades. If no slice is gradable,
    /// [`UNGRADABLE`] is returned.
    pub fn grade(&self) -> f64 {
        let (sum, count) = self
            .grades()
            .iter()
            .filter(|&&g| g != UNGRADABLE)
            .fold((0.0, 0), |(sum, count), &g| (sum + g, count + 1));
        if count == 0 {
            UNGRADABLE
        } else {
            sum / count as f64
        }
    }
}

/// The gains of a single antenna in a [`GainSolutionRecord`]. "pol1" is the
/// second of the two parallel-hand polarisations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaGains {
    pub gain_pol0_real: Vec<f64>,
    pub gain_pol0_imag: Vec<f64>,
    pub gain_pol1_real: Vec<f64>,
    pub gain_pol1_imag: Vec<f64>,
}

impl AntennaGains {
    /// The complex gains of both polarisations.
    pub fn gains(&self) -> [Vec<c64>; 2] {
        let combine = |re: &[f64], im: &[f64]| -> Vec<c64> {
            re.iter().zip(im).map(|(&re, &im)| c64::new(re, im)).collect()
        };
        [
            combine(&self.gain_pol0_real, &self.gain_pol0_imag),
            combine(&self.gain_pol1_real, &self.gain_pol1_imag),
        ]
    }

    /// The gain phases of both polarisations \[radians\].
    pub fn phases(&self) -> [Vec<f64>; 2] {
        self.gains().map(|g| g.iter().map(|g| g.arg()).collect())
    }
}

/// A time-averaged [`GainSolution`] for interchange, keyed by antenna label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainSolutionRecord {
    /// The label of the reference antenna (e.g. "ea10").
    pub reference_antenna: String,

    /// The frequency of every channel \[Hz\].
    pub freqs_hz: Vec<f64>,

    /// The grade of the solution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,

    /// The grade of a solution re-derived after applying this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_grade: Option<f64>,

    pub gains: IndexMap<String, AntennaGains>,
}

impl GainSolutionRecord {
    /// Make a record from a solution with the antenna axis first; gains are
    /// averaged over the time axis (ignoring zeros).
    pub fn from_solution(
        solution: &GainSolution,
        freqs_hz: &[f64],
    ) -> Result<GainSolutionRecord, SolutionsWriteError> {
        if solution.antenna_axis != 0 {
            return Err(SolutionsWriteError::AntennaAxis(solution.antenna_axis));
        }
        let (_, _, num_channels, num_pols) = solution.gains.dim();
        if num_pols != NUM_POLS {
            return Err(SolutionsWriteError::PolMismatch {
                expected: NUM_POLS,
                got: num_pols,
            });
        }
        if num_channels != freqs_hz.len() {
            return Err(SolutionsWriteError::ChannelMismatch {
                gains: num_channels,
                freqs: freqs_hz.len(),
            });
        }

        let averaged = average_ignoring_zeros(solution.gains.view(), &[1]);
        let gains = solution
            .antennas
            .iter()
            .zip(averaged.outer_iter())
            .map(|(&antenna, gains_tfp)| {
                let [p0, p1] = POL_INDICES;
                let pol0 = gains_tfp.slice(s![0, .., p0]);
                let pol1 = gains_tfp.slice(s![0, .., p1]);
                (
                    VisContext::antenna_label(antenna),
                    AntennaGains {
                        gain_pol0_real: pol0.iter().map(|g| g.re).collect(),
                        gain_pol0_imag: pol0.iter().map(|g| g.im).collect(),
                        gain_pol1_real: pol1.iter().map(|g| g.re).collect(),
                        gain_pol1_imag: pol1.iter().map(|g| g.im).collect(),
                    },
                )
            })
            .collect();

        Ok(GainSolutionRecord {
            reference_antenna: VisContext::antenna_label(solution.reference_antenna),
            freqs_hz: freqs_hz.to_vec(),
            grade: Some(solution.grade()),
            proposed_grade: None,
            gains,
        })
    }

    /// Fit a delay to the gain phases of every antenna and both polarisations.
    pub fn phase_delays(&self) -> Result<IndexMap<String, [PhaseDelayFit; 2]>, DelayError> {
        self.gains
            .iter()
            .map(|(label, gains)| {
                let [p0, p1] = gains.phases();
                Ok((
                    label.clone(),
                    [
                        fit_phase_delay(&self.freqs_hz, &p0)?,
                        fit_phase_delay(&self.freqs_hz, &p1)?,
                    ],
                ))
            })
            .collect()
    }

    pub fn write_json<P: AsRef<Path>>(&self, file: P) -> Result<(), SolutionsWriteError> {
        debug!("Writing gain solutions to {}", file.as_ref().display());
        let f = BufWriter::new(File::create(file)?);
        serde_json::to_writer_pretty(f, self)?;
        Ok(())
    }

    pub fn read_json<P: AsRef<Path>>(file: P) -> Result<GainSolutionRecord, SolutionsReadError> {
        let f = BufReader::new(File::open(file)?);
        let record: GainSolutionRecord = serde_json::from_reader(f)?;
        record.check_shapes()?;
        Ok(record)
    }

    fn check_shapes(&self) -> Result<(), SolutionsReadError> {
        let expected = self.freqs_hz.len();
        for (antenna, gains) in &self.gains {
            for (field, values) in [
                ("gain_pol0_real", &gains.gain_pol0_real),
                ("gain_pol0_imag", &gains.gain_pol0_imag),
                ("gain_pol1_real", &gains.gain_pol1_real),
                ("gain_pol1_imag", &gains.gain_pol1_imag),
            ] {
                if values.len() != expected {
                    return Err(SolutionsReadError::BadShape {
                        antenna: antenna.clone(),
                        field,
                        expected,
                        got: values.len(),
                    });
                }
            }
        }
        Ok(())
    }
}
