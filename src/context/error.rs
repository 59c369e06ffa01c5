// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::baselines::BaselineError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("Antenna {0} appears more than once in the antenna list")]
    DuplicateAntenna(u32),

    #[error("The channel width must be a positive number of Hz, but got {0}")]
    BadChannelWidth(f64),

    #[error("The visibilities have no timesteps")]
    NoTimesteps,

    #[error("The visibilities have {got} channels, but {expected} frequencies are known")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("The visibilities have {got} polarisation products, but {expected} are expected")]
    PolMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Baseline(#[from] BaselineError),
}
