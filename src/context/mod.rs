// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Metadata on a set of visibilities.

mod error;

pub use error::ContextError;

use ndarray::prelude::*;
use vec1::Vec1;

use crate::{
    baselines::BaselineIndexTable,
    c64,
    constants::{ANTENNA_LABEL_PREFIX, NUM_POLS},
};

/// Visibility metadata.
///
/// This is everything the external visibility reader provides alongside the
/// visibilities themselves. The [`BaselineIndexTable`] is made exactly once
/// here, so everything working with the same context agrees on the baseline
/// ordering.
#[derive(Debug, Clone)]
pub struct VisContext {
    /// The IDs of the antennas present in the data, in the order used by the
    /// baseline axis (i.e. antenna position 0 in the [`BaselineIndexTable`] is
    /// the first ID here).
    pub antennas: Vec1<u32>,

    /// The mapping between baseline-axis positions and antenna pairs.
    pub baselines: BaselineIndexTable,

    /// The centre frequencies of every channel \[Hz\].
    pub freqs_hz: Vec1<f64>,

    /// The width of a single channel \[Hz\].
    pub channel_width_hz: f64,

    /// The time resolution of the visibilities \[seconds\].
    pub integration_time_s: f64,
}

impl VisContext {
    pub fn new(
        antennas: Vec1<u32>,
        freqs_hz: Vec1<f64>,
        channel_width_hz: f64,
        integration_time_s: f64,
    ) -> Result<VisContext, ContextError> {
        for (i, a) in antennas.iter().enumerate() {
            if antennas.iter().skip(i + 1).any(|b| a == b) {
                return Err(ContextError::DuplicateAntenna(*a));
            }
        }
        if !(channel_width_hz.is_finite() && channel_width_hz > 0.0) {
            return Err(ContextError::BadChannelWidth(channel_width_hz));
        }

        let baselines = BaselineIndexTable::new(antennas.len());
        Ok(VisContext {
            antennas,
            baselines,
            freqs_hz,
            channel_width_hz,
            integration_time_s,
        })
    }

    pub fn num_antennas(&self) -> usize {
        self.antennas.len()
    }

    pub fn num_channels(&self) -> usize {
        self.freqs_hz.len()
    }

    /// Get the position of an antenna ID in the antenna list.
    pub fn antenna_index(&self, antenna: u32) -> Option<usize> {
        self.antennas.iter().position(|&a| a == antenna)
    }

    /// Get the human-readable label of an antenna ID, e.g. "ea05".
    pub fn antenna_label(antenna: u32) -> String {
        format!("{ANTENNA_LABEL_PREFIX}{antenna:02}")
    }

    /// Parse an antenna label (e.g. "ea05") back into its ID. Bare numbers are
    /// also accepted.
    pub fn parse_antenna_label(label: &str) -> Option<u32> {
        let label = label.trim();
        label
            .strip_prefix(ANTENNA_LABEL_PREFIX)
            .unwrap_or(label)
            .parse()
            .ok()
    }

    /// Check that a visibility array is consistent with this context. The
    /// array must be [baseline, time, channel, polarisation].
    pub fn validate_vis(&self, vis_btfp: ArrayView4<c64>) -> Result<(), ContextError> {
        let (num_baselines, num_timesteps, num_channels, num_pols) = vis_btfp.dim();
        self.baselines.check_num_baselines(num_baselines)?;
        if num_timesteps == 0 {
            return Err(ContextError::NoTimesteps);
        }
        if num_channels != self.num_channels() {
            return Err(ContextError::ChannelMismatch {
                expected: self.num_channels(),
                got: num_channels,
            });
        }
        if num_pols != NUM_POLS {
            return Err(ContextError::PolMismatch {
                expected: NUM_POLS,
                got: num_pols,
            });
        }
        Ok(())
    }
}
