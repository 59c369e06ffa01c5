// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with RFI flags.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlaggingError {
    #[error("Reference antenna {0} is not in the visibilities")]
    MissingReference(u32),

    #[error("The flags are for {got} baselines, but the visibilities have {expected}")]
    NumBaselines { expected: usize, got: usize },
}
