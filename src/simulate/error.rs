// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with simulating visibilities.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulateError {
    #[error("Got {delays} antenna delays but {amplitudes} antenna amplitudes; these must be the same")]
    ModelLengths { delays: usize, amplitudes: usize },

    #[error("Expected gains with shape {expected:?} ([antenna, frequency]), but got {got:?}")]
    GainShape {
        expected: (usize, usize),
        got: (usize, usize),
    },
}
