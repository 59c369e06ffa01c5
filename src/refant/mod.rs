// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Selecting a reference antenna.


use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefAntError {
    #[error("None of the candidate reference antennas {priority:?} were observed and not excluded (excluded: {exclusions:?})")]
    NoCandidate {
        priority: Vec<u32>,
        exclusions: Vec<u32>,
    },
}

/// Pick the first antenna in `priority` that was observed and isn't excluded.
pub fn select_reference_antenna(
    priority: &[u32],
    exclusions: &[u32],
    observed: &[u32],
) -> Result<u32, RefAntError> {
    priority
        .iter()
        .copied()
        .find(|a| observed.contains(a) && !exclusions.contains(a))
        .map(|a| {
            debug!("Selected antenna {a} as the reference");
            a
        })
        .ok_or_else(|| RefAntError::NoCandidate {
            priority: priority.to_vec(),
            exclusions: exclusions.to_vec(),
        })
}
