// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Residual delays of antennas.
//!
//! A delay between two antennas is a phase ramp across frequency in their
//! baseline's visibilities. Transforming the spectrum into the lag domain
//! turns the ramp into a peak, and the peak's position is the delay.

mod error;
mod fixed;
mod phase_fit;

pub use error::{DelayError, FixedDelaysError};
pub use fixed::{update_fixed_delays, FixedDelays, FixedDelaysUpdate, Tuning, NUM_STREAMS};
pub use phase_fit::{fit_phase_delay, PhaseDelayFit};

use std::{path::Path, sync::Arc};

use indexmap::IndexMap;
use log::{debug, trace};
use ndarray::prelude::*;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::{
    c64,
    constants::{NS_PER_S, NUM_DELAY_LAGS, POL_INDICES},
    math::{centred_fft_freqs, fftshift},
    VisContext,
};

/// Finds the delays of baselines with an inverse FFT over frequency.
pub struct DelayEstimator {
    /// The lag of every (shifted) FFT bin \[ns\].
    lags_ns: Vec<f64>,

    ifft: Arc<dyn Fft<f64>>,
}

impl DelayEstimator {
    /// Make a new estimator for visibilities with channels `channel_width_hz`
    /// wide.
    pub fn new(channel_width_hz: f64) -> Result<DelayEstimator, DelayError> {
        if !(channel_width_hz.is_finite() && channel_width_hz > 0.0) {
            return Err(DelayError::BadChannelWidth(channel_width_hz));
        }
        let lags_ns = centred_fft_freqs(NUM_DELAY_LAGS, channel_width_hz)
            .into_iter()
            .map(|lag_s| lag_s * NS_PER_S)
            .collect();
        let ifft = FftPlanner::new().plan_fft_inverse(NUM_DELAY_LAGS);
        Ok(DelayEstimator { lags_ns, ifft })
    }

    pub fn lags_ns(&self) -> &[f64] {
        &self.lags_ns
    }

    /// The spacing of the lags \[ns\]. A delay can't be determined more
    /// precisely than this.
    pub fn lag_resolution_ns(&self) -> f64 {
        self.lags_ns[1] - self.lags_ns[0]
    }

    /// Get the delay of every baseline and timestep of the two parallel-hand
    /// polarisations. `vis` is [baseline, time, channel, polarisation] and the
    /// returned array is [baseline, time, polarisation] \[ns\].
    ///
    /// Spectra with more channels than there are lags are truncated.
    pub fn baseline_delays(&self, vis: ArrayView4<c64>) -> Array3<f64> {
        let (num_baselines, num_timesteps, num_channels, _) = vis.dim();
        if num_channels > NUM_DELAY_LAGS {
            debug!("Truncating {num_channels} channels to {NUM_DELAY_LAGS} for the delay transform");
        }
        let num_used = num_channels.min(NUM_DELAY_LAGS);

        let mut delays = Array3::zeros((num_baselines, num_timesteps, POL_INDICES.len()));
        let mut buffer = vec![c64::default(); NUM_DELAY_LAGS];
        let mut scratch = vec![c64::default(); self.ifft.get_inplace_scratch_len()];
        for (vis_tfp, mut delays_tp) in vis.outer_iter().zip(delays.outer_iter_mut()) {
            for (vis_fp, mut delays_p) in vis_tfp.outer_iter().zip(delays_tp.outer_iter_mut()) {
                for (&pol, delay) in POL_INDICES.iter().zip(delays_p.iter_mut()) {
                    buffer.fill(c64::default());
                    buffer
                        .iter_mut()
                        .zip(vis_fp.column(pol).iter().take(num_used))
                        .for_each(|(b, &v)| *b = v);
                    self.ifft.process_with_scratch(&mut buffer, &mut scratch);
                    fftshift(&mut buffer);

                    // The first maximum wins.
                    let mut i_peak = 0;
                    let mut peak = f64::NEG_INFINITY;
                    for (i, v) in buffer.iter().enumerate() {
                        let amp = v.norm();
                        if amp > peak {
                            peak = amp;
                            i_peak = i;
                        }
                    }
                    *delay = self.lags_ns[i_peak];
                }
            }
        }

        delays
    }

    /// The time-averaged delay of every baseline; [baseline, polarisation]
    /// \[ns\].
    pub fn mean_baseline_delays(&self, vis: ArrayView4<c64>) -> Array2<f64> {
        let delays = self.baseline_delays(vis);
        let num_timesteps = delays.len_of(Axis(1)).max(1);
        delays.sum_axis(Axis(1)) / num_timesteps as f64
    }

    /// Attribute baseline delays ([baseline, polarisation]) to antennas,
    /// relative to `reference`.
    ///
    /// Only baselines with the reference antenna are used. The delay of such a
    /// baseline belongs to its other antenna, and is "antenna minus reference";
    /// the sign of a baseline's delay is flipped if the reference is its first
    /// antenna. The reference antenna's own entry comes from its
    /// auto-correlation.
    pub fn residual_delays(
        context: &VisContext,
        reference: u32,
        delays_bp: ArrayView2<f64>,
    ) -> Result<DelaySolution, DelayError> {
        let i_ref = context
            .antenna_index(reference)
            .ok_or(DelayError::MissingReference(reference))?;
        if delays_bp.len_of(Axis(0)) != context.baselines.len() {
            return Err(DelayError::NumBaselines {
                expected: context.baselines.len(),
                got: delays_bp.len_of(Axis(0)),
            });
        }

        let mut delays_ns = IndexMap::with_capacity(context.num_antennas());
        for ((a1, a2), delays_p) in context.baselines.iter().zip(delays_bp.outer_iter()) {
            let (other, sign) = match (a1 == i_ref, a2 == i_ref) {
                (true, true) => (i_ref, 1.0),
                (true, false) => (a2, -1.0),
                (false, true) => (a1, 1.0),
                (false, false) => continue,
            };
            let label = VisContext::antenna_label(context.antennas[other]);
            trace!("{label}: {} ns, {} ns", sign * delays_p[0], sign * delays_p[1]);
            delays_ns.insert(label, [sign * delays_p[0], sign * delays_p[1]]);
        }

        Ok(DelaySolution {
            reference_antenna: Some(VisContext::antenna_label(reference)),
            delays_ns,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DelayRow {
    #[serde(rename = "Baseline")]
    antenna: String,
    res_pol0: f64,
    res_pol1: f64,
}

/// Per-antenna residual delays of the two parallel-hand polarisations,
/// relative to a reference antenna \[ns\].
#[derive(Debug, Clone, PartialEq)]
pub struct DelaySolution {
    /// The label of the reference antenna, if known. Delay files don't record
    /// it.
    pub reference_antenna: Option<String>,

    /// Delays keyed by antenna label (e.g. "ea05").
    pub delays_ns: IndexMap<String, [f64; 2]>,
}

impl DelaySolution {
    pub fn get(&self, label: &str) -> Option<[f64; 2]> {
        self.delays_ns.get(label).copied()
    }

    /// Write the delays as CSV with the header "Baseline,res_pol0,res_pol1"
    /// (the first column holds antenna labels).
    pub fn write_csv<P: AsRef<Path>>(&self, file: P) -> Result<(), DelayError> {
        let mut writer = csv::Writer::from_path(file)?;
        for (antenna, [res_pol0, res_pol1]) in &self.delays_ns {
            writer.serialize(DelayRow {
                antenna: antenna.clone(),
                res_pol0: *res_pol0,
                res_pol1: *res_pol1,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read delays written by [`DelaySolution::write_csv`]. Whitespace around
    /// fields is ignored, and antenna labels may also be bare numbers.
    pub fn read_csv<P: AsRef<Path>>(file: P) -> Result<DelaySolution, DelayError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(file)?;
        let mut delays_ns = IndexMap::new();
        for result in reader.deserialize() {
            let row: DelayRow = result?;
            let antenna = VisContext::parse_antenna_label(&row.antenna)
                .ok_or_else(|| DelayError::BadLabel {
                    line: delays_ns.len() as u64 + 2,
                    label: row.antenna.clone(),
                })?;
            delays_ns.insert(
                VisContext::antenna_label(antenna),
                [row.res_pol0, row.res_pol1],
            );
        }
        Ok(DelaySolution {
            reference_antenna: None,
            delays_ns,
        })
    }
}
