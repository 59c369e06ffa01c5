// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The mapping between positions on a visibility array's baseline axis and
//! antenna pairs.
//!
//! The ordering is a hard contract with whatever produced the visibilities:
//! all auto-correlation pairs (i, i) in increasing i come first, followed by
//! all cross-correlation pairs (i, j) with i < j in row-major order. A table
//! should be made once per set of antennas and shared between everything that
//! works with that set; regenerating it inconsistently silently corrupts
//! results.


use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BaselineError {
    #[error("The visibilities have {got} baselines, but {expected} are expected for {num_antennas} antennas (autos included)")]
    Mismatch {
        expected: usize,
        got: usize,
        num_antennas: usize,
    },
}

/// The canonical ordered list of antenna pairs of a baseline axis. Antennas are
/// referred to by their zero-indexed position in an antenna list, not by their
/// IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineIndexTable {
    num_antennas: usize,
    pairs: Vec<(usize, usize)>,
}

impl BaselineIndexTable {
    pub fn new(num_antennas: usize) -> BaselineIndexTable {
        let mut pairs = Vec::with_capacity(num_antennas * (num_antennas + 1) / 2);
        pairs.extend((0..num_antennas).map(|i| (i, i)));
        for i in 0..num_antennas {
            for j in i + 1..num_antennas {
                pairs.push((i, j));
            }
        }

        BaselineIndexTable {
            num_antennas,
            pairs,
        }
    }

    /// The number of baselines (autos included).
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn num_antennas(&self) -> usize {
        self.num_antennas
    }

    pub fn get(&self, i_baseline: usize) -> Option<(usize, usize)> {
        self.pairs.get(i_baseline).copied()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().copied()
    }

    /// Iterate over the cross-correlation baselines only, yielding the position
    /// of each baseline on the baseline axis alongside its antenna pair.
    pub fn cross_baselines(&self) -> impl Iterator<Item = (usize, (usize, usize))> + '_ {
        self.pairs
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, (a1, a2))| a1 != a2)
    }

    /// Find the position of an antenna pair on the baseline axis. The order of
    /// the antennas doesn't matter.
    pub fn position_of(&self, a1: usize, a2: usize) -> Option<usize> {
        let (a1, a2) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
        if a2 >= self.num_antennas {
            return None;
        }
        if a1 == a2 {
            return Some(a1);
        }
        // Skip the autos, then the rows of all earlier antennas.
        let n = self.num_antennas;
        let row_start = a1 * n - a1 * (a1 + 1) / 2;
        Some(n + row_start + (a2 - a1 - 1))
    }

    /// Ensure that a baseline axis of length `num_baselines` is consistent with
    /// this table.
    pub fn check_num_baselines(&self, num_baselines: usize) -> Result<(), BaselineError> {
        if num_baselines == self.len() {
            Ok(())
        } else {
            Err(BaselineError::Mismatch {
                expected: self.len(),
                got: num_baselines,
                num_antennas: self.num_antennas,
            })
        }
    }
}

/// Get the number of antennas from a number of baselines that includes
/// auto-correlations (i.e. invert N(N+1)/2). `None` is returned if the number
/// isn't triangular.
pub fn num_antennas_from_num_baselines(num_baselines: usize) -> Option<usize> {
    // Start from the floating-point guess and then verify with integers.
    let guess = ((((8 * num_baselines + 1) as f64).sqrt() - 1.0) / 2.0).round() as usize;
    if guess * (guess + 1) / 2 == num_baselines {
        Some(guess)
    } else {
        None
    }
}

/// The index of a cross-correlation baseline in a triangular, autos-excluded
/// ordering where baseline (a1, a2), a1 < a2, sits at a2(a2-1)/2 + a1. The
/// order of the antennas doesn't matter. `None` is returned for an
/// auto-correlation.
pub fn cross_baseline_index(a1: usize, a2: usize) -> Option<usize> {
    let (a1, a2) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
    if a1 == a2 {
        None
    } else {
        Some(a2 * (a2 - 1) / 2 + a1)
    }
}

/// The inverse of [`cross_baseline_index`].
pub fn cross_baseline_antennas(i_baseline: usize) -> (usize, usize) {
    // a2 is the largest integer with a2(a2-1)/2 <= i_baseline.
    let mut a2 = ((1.0 + ((1 + 8 * i_baseline) as f64).sqrt()) / 2.0) as usize;
    while a2 * (a2 - 1) / 2 > i_baseline {
        a2 -= 1;
    }
    while (a2 + 1) * a2 / 2 <= i_baseline {
        a2 += 1;
    }
    (i_baseline - a2 * (a2 - 1) / 2, a2)
}
