// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Delays from the slope of phase against frequency.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::DelayError;
use crate::{
    constants::NS_PER_S,
    math::{linear_fit, unwrap_phases},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDelayFit {
    /// The delay corresponding to the fitted phase slope \[ns\].
    pub delay_ns: f64,

    /// The unwrapped phases minus the fitted slope (but not the intercept),
    /// wrapped into [0, 2π) \[radians\].
    pub residual_phases: Vec<f64>,
}

/// Unwrap `phases` \[radians\] and fit a straight line against `freqs_hz`. The
/// delay is slope / 2π.
pub fn fit_phase_delay(freqs_hz: &[f64], phases: &[f64]) -> Result<PhaseDelayFit, DelayError> {
    let unwrapped = unwrap_phases(phases);
    let (slope, _) = linear_fit(freqs_hz, &unwrapped)
        .ok_or(DelayError::TooFewChannels(freqs_hz.len().min(phases.len())))?;
    let residual_phases = freqs_hz
        .iter()
        .zip(unwrapped)
        .map(|(f, p)| (p - slope * f).rem_euclid(TAU))
        .collect();
    Ok(PhaseDelayFit {
        delay_ns: slope / TAU * NS_PER_S,
        residual_phases,
    })
}
