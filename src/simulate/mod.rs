// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate visibilities from a per-antenna gain model.
//!
//! Every antenna sees the same flat-spectrum point source, so the visibility
//! of baseline (i, j) is just g_i conj(g_j). All four polarisation products
//! are given the same value.

mod error;

pub use error::SimulateError;

use std::f64::consts::TAU;

use log::warn;
use ndarray::prelude::*;

use crate::{c64, constants::NS_PER_S, VisContext};

/// Gains of antennas with pure delays: g_k(f) = A_k exp(-2πi f τ_k). The
/// returned array is [antenna, frequency].
///
/// # Errors
///
/// Returns an error if the number of delays and amplitudes differ.
pub fn delay_gains(
    freqs_hz: &[f64],
    delays_ns: &[f64],
    amplitudes: &[f64],
) -> Result<Array2<c64>, SimulateError> {
    if delays_ns.len() != amplitudes.len() {
        return Err(SimulateError::ModelLengths {
            delays: delays_ns.len(),
            amplitudes: amplitudes.len(),
        });
    }

    Ok(Array2::from_shape_fn(
        (delays_ns.len(), freqs_hz.len()),
        |(i_ant, i_freq)| {
            let tau_s = delays_ns[i_ant] / NS_PER_S;
            c64::from_polar(amplitudes[i_ant], -TAU * freqs_hz[i_freq] * tau_s)
        },
    ))
}

/// Generate visibilities [baseline, time, channel, polarisation] from the
/// gains `gains_af` ([antenna, frequency]). The gains don't change with time.
///
/// # Errors
///
/// Returns an error if the gains don't match the context's antennas and
/// channels.
pub fn simulate_vis(
    context: &VisContext,
    gains_af: ArrayView2<c64>,
    num_timesteps: usize,
) -> Result<Array4<c64>, SimulateError> {
    let expected = (context.num_antennas(), context.num_channels());
    if gains_af.dim() != expected {
        return Err(SimulateError::GainShape {
            expected,
            got: gains_af.dim(),
        });
    }

    let mut vis = Array4::zeros((
        context.baselines.len(),
        num_timesteps,
        context.num_channels(),
        crate::constants::NUM_POLS,
    ));
    for ((a1, a2), mut vis_tfp) in context.baselines.iter().zip(vis.outer_iter_mut()) {
        let g1 = gains_af.row(a1);
        let g2 = gains_af.row(a2);
        for mut vis_fp in vis_tfp.outer_iter_mut() {
            for ((mut vis_p, &g1), &g2) in vis_fp.outer_iter_mut().zip(g1).zip(g2) {
                vis_p.fill(g1 * g2.conj());
            }
        }
    }

    Ok(vis)
}

/// Add narrowband interference with a real-valued `amplitude` to every sample
/// of the specified channels. Channels outside the visibilities are ignored.
pub fn inject_rfi(mut vis: ArrayViewMut4<c64>, channels: &[usize], amplitude: f64) {
    let num_channels = vis.len_of(Axis(2));
    for &chan in channels {
        if chan >= num_channels {
            warn!("Cannot inject RFI into channel {chan}; there are only {num_channels} channels");
            continue;
        }
        vis.slice_mut(s![.., .., chan, ..])
            .mapv_inplace(|v| v + amplitude);
    }
}
