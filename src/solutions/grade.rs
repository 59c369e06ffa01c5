// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Grading the quality of gains.

use log::debug;
use ndarray::prelude::*;

use super::{apply_gains, GainSolution, GradeError};
use crate::{
    c64,
    constants::UNGRADABLE,
    gaincal::{gaincal, GainCalParams},
    VisContext,
};

/// Grade some antenna gains by their phase coherence: |Σg| / Σ|g|.
///
/// The grade is 1 when all gains share the same phase and approaches 0 as
/// their phases disagree. If the grade can't be calculated (e.g. all gains are
/// zero), [`UNGRADABLE`] is returned.
pub fn grade_gains(gains: ArrayView1<c64>) -> f64 {
    let sum: c64 = gains.sum();
    let sum_of_amps: f64 = gains.iter().map(|g| g.norm()).sum();
    let grade = sum.norm() / sum_of_amps;
    if grade.is_finite() {
        grade
    } else {
        UNGRADABLE
    }
}

/// Apply a solution (phase only) to a copy of the visibilities, solve again,
/// and grade the new solution. A good solution leaves little phase structure
/// behind, so the re-derived gains should be coherent.
pub fn propose_grade(
    vis: ArrayView4<c64>,
    context: &VisContext,
    solution: &GainSolution,
    params: &GainCalParams,
) -> Result<f64, GradeError> {
    let mut corrected = vis.to_owned();
    apply_gains(corrected.view_mut(), context, solution, true)?;
    let proposed = gaincal(corrected.view(), context, params)?;
    let grade = proposed.grade();
    debug!("Proposed grade: {grade}");
    Ok(grade)
}
