// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.
//!
//! All constants *must* be double precision.

/// The number of polarisation products in a visibility array.
pub const NUM_POLS: usize = 4;

/// The positions of the two parallel-hand polarisation products (e.g. RR and
/// LL) on the polarisation axis.
pub const POL_INDICES: [usize; 2] = [0, 3];

/// The default number of fixed-point iterations of the eigen solver.
pub const DEFAULT_GAINCAL_ITERATIONS: u32 = 3;

/// The number of lags used when transforming a spectrum into the delay domain.
/// Spectra are zero-padded (or truncated) to this many channels.
pub const NUM_DELAY_LAGS: usize = 1024;

/// The default clipping threshold of the RFI flaggers, in units of median
/// absolute deviations.
pub const DEFAULT_RFI_THRESHOLD: f64 = 3.0;

/// A spectrum's median absolute deviation is treated as zero (and nothing is
/// flagged) when it is below this fraction of the spectrum's median amplitude.
pub const MAD_RELATIVE_FLOOR: f64 = 1e-12;

/// The smallest sliding-window size of the smoothed-bandpass flagger
/// \[channels\].
pub const MIN_RFI_WINDOW: usize = 10;

/// The largest sliding-window size of the smoothed-bandpass flagger
/// \[channels\].
pub const MAX_RFI_WINDOW: usize = 20;

/// The grade given to a gain solution that cannot be graded (e.g. all gains
/// are zero).
pub const UNGRADABLE: f64 = -1.0;

/// The prefix used when labelling antennas (e.g. antenna 5 is "ea05").
pub const ANTENNA_LABEL_PREFIX: &str = "ea";

/// Seconds to nanoseconds.
pub(crate) const NS_PER_S: f64 = 1e9;
