// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::{debug, info, warn};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::CalibrateError;
use crate::{
    c64,
    delays::{DelayEstimator, DelaySolution},
    flagging::{AntennaFlags, RfiFlagger, RfiFlags},
    gaincal::{gaincal, GainCalParams},
    solutions::{propose_grade, reference_phases, GainSolution, GainSolutionRecord, ReferencePhases},
    VisContext,
};

/// Parameters needed to calibrate some visibilities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Should the solution be applied and re-derived to propose a grade?
    pub propose_grade: bool,

    /// Should residual delays be estimated?
    pub estimate_delays: bool,

    pub gaincal: GainCalParams,

    /// If specified, RFI is flagged out of (a copy of) the visibilities before
    /// anything else is done.
    pub flagger: Option<RfiFlagger>,
}

/// Everything derived by [`CalibrationParams::run`].
#[derive(Debug, Clone)]
pub struct CalibrationOutputs {
    pub solution: GainSolution,

    /// The solution ready to be written out, with its grades.
    pub record: GainSolutionRecord,

    pub rfi_flags: Option<RfiFlags>,

    /// RFI flags translated to frequencies of each antenna.
    pub antenna_flags: Option<AntennaFlags>,

    pub delays: Option<DelaySolution>,

    pub reference_phases: ReferencePhases,
}

impl CalibrationParams {
    /// Use the [`CalibrationParams`] to calibrate visibilities ([baseline,
    /// time, channel, polarisation]). The input is never modified.
    ///
    /// The antenna used as the reference for flags, delays and phases is the
    /// one the gains were normalised to, which may not be the requested one if
    /// it isn't in the data.
    pub fn run(
        &self,
        vis: ArrayView4<c64>,
        context: &VisContext,
    ) -> Result<CalibrationOutputs, CalibrateError> {
        if self.gaincal.baseline_axis != 0 {
            return Err(CalibrateError::BaselineAxis(self.gaincal.baseline_axis));
        }
        context.validate_vis(vis)?;
        let (num_baselines, num_timesteps, num_channels, _) = vis.dim();
        info!(
            "Calibrating {} antennas ({num_baselines} baselines), {num_timesteps} timesteps and {num_channels} channels",
            context.num_antennas()
        );

        let (vis, rfi_flags): (CowArray<c64, Ix4>, _) = match self.flagger {
            Some(flagger) => {
                let (flagged, flags) = flagger.flag(vis);
                info!("Flagged {} channels of RFI", flags.num_flagged());
                (CowArray::from(flagged), Some(flags))
            }
            None => (CowArray::from(vis), None),
        };

        let solution = gaincal(vis.view(), context, &self.gaincal)?;
        let reference = solution.reference_antenna;
        let grade = solution.grade();
        info!("Solution grade: {grade}");

        let proposed_grade = if self.propose_grade {
            let proposed = propose_grade(vis.view(), context, &solution, &self.gaincal)?;
            info!("Proposed grade: {proposed}");
            Some(proposed)
        } else {
            None
        };
        let mut record = GainSolutionRecord::from_solution(&solution, &context.freqs_hz)?;
        record.proposed_grade = proposed_grade;

        let antenna_flags = match rfi_flags.as_ref() {
            Some(flags) => Some(flags.to_antenna_flags(context, reference)?),
            None => None,
        };

        let delays = if self.estimate_delays {
            let estimator = DelayEstimator::new(context.channel_width_hz)?;
            debug!(
                "Estimating delays with a lag resolution of {} ns",
                estimator.lag_resolution_ns()
            );
            let delays_bp = estimator.mean_baseline_delays(vis.view());
            let delays = DelayEstimator::residual_delays(context, reference, delays_bp.view())?;
            for (antenna, [d0, d1]) in &delays.delays_ns {
                debug!("{antenna}: {d0} ns, {d1} ns");
            }
            Some(delays)
        } else {
            None
        };

        let reference_phases = reference_phases(vis.view(), context, reference)?;
        if reference_phases.antennas.is_empty() {
            warn!("There are no baselines with the reference antenna; no reference phases");
        }

        Ok(CalibrationOutputs {
            solution,
            record,
            rfi_flags,
            antenna_flags,
            delays,
            reference_phases,
        })
    }
}
