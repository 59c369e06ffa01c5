// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpful functions for tests.

use ndarray::prelude::*;
use vec1::Vec1;

use crate::{c64, simulate::simulate_vis, VisContext};

/// A context with antenna IDs 0..`num_antennas`, 1 MHz channels starting at 1
/// GHz and 1 s integrations.
pub(crate) fn make_context(num_antennas: usize, num_channels: usize) -> VisContext {
    let antennas = Vec1::try_from_vec((0..num_antennas as u32).collect()).unwrap();
    let freqs = Vec1::try_from_vec(
        (0..num_channels)
            .map(|i| 1e9 + i as f64 * 1e6)
            .collect(),
    )
    .unwrap();
    VisContext::new(antennas, freqs, 1e6, 1.0).unwrap()
}

/// Visibilities made from frequency-independent antenna gains.
pub(crate) fn vis_from_gains(
    context: &VisContext,
    gains: &[c64],
    num_timesteps: usize,
) -> Array4<c64> {
    let gains_af = Array2::from_shape_fn((gains.len(), context.num_channels()), |(i, _)| {
        gains[i]
    });
    simulate_vis(context, gains_af.view(), num_timesteps).unwrap()
}

/// A selection of gains with a variety of amplitudes and phases.
pub(crate) fn varied_gains(num_antennas: usize) -> Vec<c64> {
    (0..num_antennas)
        .map(|k| {
            let amp = 0.8 + 0.4 * ((k * 7) % 5) as f64 / 4.0;
            c64::from_polar(amp, 0.3 * k as f64 - 1.0)
        })
        .collect()
}
