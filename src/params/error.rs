// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrateError {
    #[error("A calibration pipeline needs the baseline axis first, but it was set to axis {0}")]
    BaselineAxis(usize),

    #[error(transparent)]
    Context(#[from] crate::context::ContextError),

    #[error(transparent)]
    GainCal(#[from] crate::gaincal::GainCalError),

    #[error(transparent)]
    Grade(#[from] crate::solutions::GradeError),

    #[error(transparent)]
    Flagging(#[from] crate::flagging::FlaggingError),

    #[error(transparent)]
    Delay(#[from] crate::delays::DelayError),

    #[error(transparent)]
    Phases(#[from] crate::solutions::PhasesError),

    #[error(transparent)]
    SolutionsWrite(#[from] crate::solutions::SolutionsWriteError),
}
