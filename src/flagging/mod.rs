// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Flagging narrowband RFI.
//!
//! Both flaggers work on the time-averaged amplitude spectrum of every
//! baseline and polarisation. Channels that deviate from a robust model of the
//! spectrum by more than `threshold` median absolute deviations are flagged,
//! and all of their samples are replaced by the model.

mod error;
#[cfg(test)]
mod tests;

pub use error::FlaggingError;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::{debug, trace};
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    c64,
    constants::{
        DEFAULT_RFI_THRESHOLD, MAD_RELATIVE_FLOOR, MAX_RFI_WINDOW, MIN_RFI_WINDOW, POL_INDICES,
    },
    math::{median, median_abs_deviation},
    VisContext,
};

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum RfiFlaggerType {
    /// The model of a spectrum is its median. Flagged channels are replaced
    /// with the median.
    #[strum(serialize = "global-median")]
    #[serde(rename = "global-median")]
    GlobalMedian,

    /// The model of a spectrum is its sliding-window median (i.e. a smoothed
    /// bandpass). Flagged channels are replaced with the model.
    #[default]
    #[strum(serialize = "smoothed-bandpass")]
    #[serde(rename = "smoothed-bandpass")]
    SmoothedBandpass,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RfiFlagger {
    pub kind: RfiFlaggerType,

    /// How many median absolute deviations a channel may be from the model
    /// before it is flagged.
    pub threshold: f64,
}

impl Default for RfiFlagger {
    fn default() -> Self {
        RfiFlagger {
            kind: RfiFlaggerType::default(),
            threshold: DEFAULT_RFI_THRESHOLD,
        }
    }
}

impl RfiFlagger {
    /// Flag visibilities ([baseline, time, channel, polarisation]) in place.
    pub fn flag_in_place(&self, mut vis: ArrayViewMut4<c64>) -> RfiFlags {
        let num_channels = vis.len_of(Axis(2));
        debug!(
            "Flagging {} baselines with the {} flagger (threshold {})",
            vis.len_of(Axis(0)),
            self.kind,
            self.threshold
        );
        if self.kind == RfiFlaggerType::SmoothedBandpass {
            trace!("Sliding window: {} channels", smoothing_window(num_channels));
        }

        let channels: Vec<Vec<Vec<usize>>> = vis
            .outer_iter_mut()
            .into_par_iter()
            .map(|mut vis_tfp| {
                let amps_fp = time_averaged_amplitudes(vis_tfp.view());
                amps_fp
                    .axis_iter(Axis(1))
                    .enumerate()
                    .map(|(i_pol, amps_f)| {
                        let amps_f = amps_f.to_vec();
                        let replacements = self.detect(&amps_f);
                        for &(chan, value) in &replacements {
                            vis_tfp
                                .slice_mut(s![.., chan, i_pol])
                                .fill(c64::new(value, 0.0));
                        }
                        replacements.into_iter().map(|(chan, _)| chan).collect::<Vec<_>>()
                    })
                    .collect()
            })
            .collect();

        let flags = RfiFlags { channels };
        debug!("Flagged {} channels in total", flags.num_flagged());
        flags
    }

    /// Flag a copy of the visibilities.
    pub fn flag(&self, vis: ArrayView4<c64>) -> (Array4<c64>, RfiFlags) {
        let mut flagged = vis.to_owned();
        let flags = self.flag_in_place(flagged.view_mut());
        (flagged, flags)
    }

    /// Find the channels of a spectrum to flag, and the values that should
    /// replace them. The channels are ascending.
    ///
    /// Replacing outliers changes the model and the MAD of the spectrum, which
    /// can expose new outliers. Detection is repeated on the replaced spectrum
    /// until nothing more is found, so flagging the output again finds nothing.
    pub fn detect(&self, amps: &[f64]) -> Vec<(usize, f64)> {
        let mut amps = amps.to_vec();
        let mut replacements = BTreeMap::new();
        for pass in 0..amps.len() {
            let found = self.detect_once(&amps);
            if found.is_empty() {
                break;
            }
            trace!("Pass {pass} found {} channels", found.len());
            for (chan, value) in found {
                amps[chan] = value;
                replacements.insert(chan, value);
            }
        }
        replacements.into_iter().collect()
    }

    fn detect_once(&self, amps: &[f64]) -> Vec<(usize, f64)> {
        match self.kind {
            RfiFlaggerType::GlobalMedian => {
                let med = median(amps);
                let mad = median_abs_deviation(amps);
                outliers(amps, med, mad, med.abs(), self.threshold)
                    .map(|chan| (chan, med))
                    .collect()
            }

            RfiFlaggerType::SmoothedBandpass => {
                let model = smoothed_bandpass(amps, smoothing_window(amps.len()));
                let residuals: Vec<f64> = amps.iter().zip(&model).map(|(a, m)| a - m).collect();
                let med = median(&residuals);
                let mad = median_abs_deviation(&residuals);
                outliers(&residuals, med, mad, median(amps).abs(), self.threshold)
                    .map(|chan| (chan, model[chan]))
                    .collect()
            }
        }
    }
}

/// The indices of values more than `threshold` MADs from `med`. Nothing is an
/// outlier if the MAD isn't finite, or is negligible compared to `scale` (the
/// typical amplitude of the spectrum).
fn outliers(
    values: &[f64],
    med: f64,
    mad: f64,
    scale: f64,
    threshold: f64,
) -> impl Iterator<Item = usize> + '_ {
    let usable = mad.is_finite() && mad > 0.0 && mad > scale * MAD_RELATIVE_FLOOR;
    values
        .iter()
        .enumerate()
        .filter(move |(_, v)| usable && (*v - med).abs() > threshold * mad)
        .map(|(i, _)| i)
}

/// The size of the sliding window used for a spectrum with `num_channels`
/// channels: a quarter of the channels, but no fewer than [`MIN_RFI_WINDOW`]
/// and no more than [`MAX_RFI_WINDOW`].
pub fn smoothing_window(num_channels: usize) -> usize {
    (num_channels / 4).clamp(MIN_RFI_WINDOW, MAX_RFI_WINDOW)
}

/// The sliding-window median of a spectrum. The window of channel i is
/// [i - w/2, i + w/2 + 1), clipped to the spectrum.
pub fn smoothed_bandpass(amps: &[f64], window: usize) -> Vec<f64> {
    let n = amps.len();
    let half = window as f64 / 2.0;
    (0..n)
        .map(|i| {
            let lo = (i as f64 - half).max(0.0) as usize;
            let hi = ((i as f64 + half + 1.0).min(n as f64)) as usize;
            median(&amps[lo..hi])
        })
        .collect()
}

/// The amplitude of visibilities ([time, channel, polarisation]) averaged over
/// time. The result is [channel, polarisation].
pub fn time_averaged_amplitudes(vis_tfp: ArrayView3<c64>) -> Array2<f64> {
    let num_timesteps = vis_tfp.len_of(Axis(0)).max(1);
    vis_tfp.mapv(|v| v.norm()).sum_axis(Axis(0)) / num_timesteps as f64
}

/// The channels flagged on every baseline and polarisation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RfiFlags {
    /// [baseline][polarisation] -> ascending channel indices.
    pub channels: Vec<Vec<Vec<usize>>>,
}

impl RfiFlags {
    pub fn num_baselines(&self) -> usize {
        self.channels.len()
    }

    /// The flagged channels of a baseline and polarisation. Empty if either is
    /// out of range.
    pub fn channels(&self, i_baseline: usize, i_pol: usize) -> &[usize] {
        self.channels
            .get(i_baseline)
            .and_then(|pols| pols.get(i_pol))
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// The flagged channels of a baseline's first polarisation, for
    /// diagnostics.
    pub fn diagnostic_channels(&self, i_baseline: usize) -> &[usize] {
        self.channels(i_baseline, 0)
    }

    /// The total number of flagged channels over all baselines and
    /// polarisations.
    pub fn num_flagged(&self) -> usize {
        self.channels.iter().flatten().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_flagged() == 0
    }

    /// Translate the flags of baselines involving `reference` into flagged
    /// frequencies of each antenna, for the two parallel-hand polarisations.
    /// The reference's own flags come from its auto-correlation.
    pub fn to_antenna_flags(
        &self,
        context: &VisContext,
        reference: u32,
    ) -> Result<AntennaFlags, FlaggingError> {
        let i_ref = context
            .antenna_index(reference)
            .ok_or(FlaggingError::MissingReference(reference))?;
        if self.num_baselines() != context.baselines.len() {
            return Err(FlaggingError::NumBaselines {
                expected: context.baselines.len(),
                got: self.num_baselines(),
            });
        }

        let freqs = context.freqs_hz.as_slice();
        let to_freqs = |chans: &[usize]| -> Vec<f64> {
            chans.iter().filter_map(|&c| freqs.get(c).copied()).collect()
        };
        let mut flagged_freqs_hz = IndexMap::new();
        for (i_bl, (a1, a2)) in context.baselines.iter().enumerate() {
            let antenna = if a1 == i_ref {
                a2
            } else if a2 == i_ref {
                a1
            } else {
                continue;
            };
            let [p0, p1] = POL_INDICES;
            flagged_freqs_hz.insert(
                VisContext::antenna_label(context.antennas[antenna]),
                [
                    to_freqs(self.channels(i_bl, p0)),
                    to_freqs(self.channels(i_bl, p1)),
                ],
            );
        }

        Ok(AntennaFlags {
            reference_antenna: VisContext::antenna_label(reference),
            flagged_freqs_hz,
        })
    }
}

/// Flagged frequencies of each antenna, relative to a reference antenna.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaFlags {
    pub reference_antenna: String,

    /// Flagged frequencies \[Hz\] of the two parallel-hand polarisations,
    /// keyed by antenna label.
    pub flagged_freqs_hz: IndexMap<String, [Vec<f64>; 2]>,
}
