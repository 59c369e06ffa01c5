// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Phases of the baselines involving a reference antenna.

use std::{fs::File, io::BufWriter, path::Path};

use indexmap::IndexMap;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::{PhasesError, SolutionsReadError, SolutionsWriteError};
use crate::{
    c64,
    constants::POL_INDICES,
    delays::{fit_phase_delay, DelayError, PhaseDelayFit},
    VisContext,
};

/// Per-antenna, per-channel phases relative to a reference antenna
/// \[radians\].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePhases {
    /// The labels of the antennas (e.g. "ea05").
    #[serde(rename = "ant_names")]
    pub antennas: Vec<String>,

    pub freqs_hz: Vec<f64>,

    /// The phases of the first parallel-hand polarisation; one row per
    /// antenna.
    pub phases_pol0: Vec<Vec<f64>>,

    /// The phases of the second parallel-hand polarisation; one row per
    /// antenna.
    pub phases_pol1: Vec<Vec<f64>>,
}

impl ReferencePhases {
    /// The phases as an array [antenna, polarisation, channel].
    pub fn to_array(&self) -> Array3<f64> {
        let num_channels = self.freqs_hz.len();
        Array3::from_shape_fn(
            (self.antennas.len(), 2, num_channels),
            |(i_ant, i_pol, i_chan)| {
                let phases = if i_pol == 0 {
                    &self.phases_pol0
                } else {
                    &self.phases_pol1
                };
                phases[i_ant][i_chan]
            },
        )
    }

    /// Fit a delay to the phases of every antenna and both polarisations.
    pub fn phase_delays(&self) -> Result<IndexMap<String, [PhaseDelayFit; 2]>, DelayError> {
        self.antennas
            .iter()
            .zip(self.phases_pol0.iter().zip(self.phases_pol1.iter()))
            .map(|(label, (p0, p1))| {
                Ok((
                    label.clone(),
                    [
                        fit_phase_delay(&self.freqs_hz, p0)?,
                        fit_phase_delay(&self.freqs_hz, p1)?,
                    ],
                ))
            })
            .collect()
    }

    pub fn write_json<P: AsRef<Path>>(&self, file: P) -> Result<(), SolutionsWriteError> {
        let f = BufWriter::new(File::create(file)?);
        serde_json::to_writer(f, self)?;
        Ok(())
    }

    pub fn read_json<P: AsRef<Path>>(file: P) -> Result<ReferencePhases, SolutionsReadError> {
        let f = std::io::BufReader::new(File::open(file)?);
        let phases: ReferencePhases = serde_json::from_reader(f)?;
        for (field, rows) in [
            ("phases_pol0", &phases.phases_pol0),
            ("phases_pol1", &phases.phases_pol1),
        ] {
            if rows.len() != phases.antennas.len() {
                return Err(SolutionsReadError::NumRows {
                    field,
                    antennas: phases.antennas.len(),
                    rows: rows.len(),
                });
            }
        }
        let expected = phases.freqs_hz.len();
        for (antenna, (p0, p1)) in phases
            .antennas
            .iter()
            .zip(phases.phases_pol0.iter().zip(phases.phases_pol1.iter()))
        {
            for (field, values) in [("phases_pol0", p0), ("phases_pol1", p1)] {
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
        Ok(phases)
    }
}

/// Get the time-averaged phases of every cross-correlation baseline involving
/// `reference`. The phases are those of the (reference, antenna) baseline; a
/// baseline with the reference as its second antenna has its phases negated.
pub fn reference_phases(
    vis: ArrayView4<c64>,
    context: &VisContext,
    reference: u32,
) -> Result<ReferencePhases, PhasesError> {
    context.validate_vis(vis)?;
    let i_ref = context
        .antenna_index(reference)
        .ok_or(PhasesError::MissingReference(reference))?;

    let mut antennas = vec![];
    let mut phases_pol0 = vec![];
    let mut phases_pol1 = vec![];
    for (i_bl, (a1, a2)) in context.baselines.cross_baselines() {
        let (other, flip) = if a1 == i_ref {
            (a2, 1.0)
        } else if a2 == i_ref {
            (a1, -1.0)
        } else {
            continue;
        };

        let vis_tfp = vis.index_axis(Axis(0), i_bl);
        let mean_fp = vis_tfp.sum_axis(Axis(0)) / vis_tfp.len_of(Axis(0)) as f64;
        let [p0, p1] = POL_INDICES;
        antennas.push(VisContext::antenna_label(context.antennas[other]));
        phases_pol0.push(mean_fp.column(p0).iter().map(|v| flip * v.arg()).collect());
        phases_pol1.push(mean_fp.column(p1).iter().map(|v| flip * v.arg()).collect());
    }

    Ok(ReferencePhases {
        antennas,
        freqs_hz: context.freqs_hz.to_vec(),
        phases_pol0,
        phases_pol1,
    })
}
