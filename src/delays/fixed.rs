// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tables of fixed delays, and updating them with residual delays.
//!
//! A fixed-delay table has one row per antenna and one column per stream
//! (IF0 to IF3). The reference antenna of a table is the one antenna with no
//! delays at all.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::{DelaySolution, FixedDelaysError};
use crate::{refant::select_reference_antenna, VisContext};

/// The number of streams (IFs) in a fixed-delay table.
pub const NUM_STREAMS: usize = 4;

/// One of the two tunable pairs of streams.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Serialize, Deserialize)]
pub enum Tuning {
    /// Streams IF0 and IF1.
    #[strum(serialize = "AC")]
    #[serde(rename = "AC")]
    Ac,

    /// Streams IF2 and IF3.
    #[strum(serialize = "BD")]
    #[serde(rename = "BD")]
    Bd,
}

impl Tuning {
    /// The indices of the streams (polarisation 0, polarisation 1) belonging
    /// to this tuning.
    pub fn streams(self) -> [usize; 2] {
        match self {
            Tuning::Ac => [0, 1],
            Tuning::Bd => [2, 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedDelays {
    /// Delays of every stream keyed by antenna label \[ns\].
    pub delays_ns: IndexMap<String, [f64; NUM_STREAMS]>,
}

impl FixedDelays {
    /// Read a table with the header ",IF0,IF1,IF2,IF3". The first column
    /// holds the antenna labels.
    pub fn read_csv<P: AsRef<Path>>(file: P) -> Result<FixedDelays, FixedDelaysError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(file)?;
        let mut delays_ns = IndexMap::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            if record.len() != NUM_STREAMS + 1 {
                return Err(FixedDelaysError::BadRow {
                    line,
                    got: record.len().saturating_sub(1),
                });
            }
            let mut delays = [0.0; NUM_STREAMS];
            for (delay, field) in delays.iter_mut().zip(record.iter().skip(1)) {
                *delay = field.parse().map_err(|_| FixedDelaysError::BadValue {
                    line,
                    value: field.to_string(),
                })?;
            }
            delays_ns.insert(record[0].to_string(), delays);
        }
        Ok(FixedDelays { delays_ns })
    }

    pub fn write_csv<P: AsRef<Path>>(&self, file: P) -> Result<(), FixedDelaysError> {
        let mut writer = csv::Writer::from_path(file)?;
        writer.write_record(["", "IF0", "IF1", "IF2", "IF3"])?;
        for (antenna, delays) in &self.delays_ns {
            let mut record = vec![antenna.clone()];
            record.extend(delays.iter().map(|d| d.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Find the reference antenna: the single antenna whose delays are all
    /// zero.
    pub fn find_reference(&self) -> Result<String, FixedDelaysError> {
        let mut zeroed = self
            .delays_ns
            .iter()
            .filter(|(_, delays)| delays.iter().all(|&d| d == 0.0))
            .map(|(antenna, _)| antenna.clone());
        match (zeroed.next(), zeroed.next()) {
            (Some(reference), None) => Ok(reference),
            (None, _) => Err(FixedDelaysError::NoReference),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(zeroed);
                Err(FixedDelaysError::AmbiguousReference(all))
            }
        }
    }

    /// Make `new_reference` the reference antenna by subtracting its delays
    /// from every antenna.
    pub fn rereference(&mut self, new_reference: &str) -> Result<(), FixedDelaysError> {
        let offsets = *self
            .delays_ns
            .get(new_reference)
            .ok_or_else(|| FixedDelaysError::MissingAntenna(new_reference.to_string()))?;
        for delays in self.delays_ns.values_mut() {
            for (d, offset) in delays.iter_mut().zip(offsets) {
                *d -= offset;
            }
        }
        Ok(())
    }

    /// Subtract the residual delays of every non-reference antenna from the
    /// streams of `tuning`. Residuals of antennas not in the table are
    /// ignored.
    pub fn apply_residuals(&mut self, tuning: Tuning, residuals: &DelaySolution, reference: &str) {
        let [s0, s1] = tuning.streams();
        for (antenna, [res_pol0, res_pol1]) in &residuals.delays_ns {
            if antenna == reference {
                continue;
            }
            match self.delays_ns.get_mut(antenna) {
                Some(delays) => {
                    delays[s0] -= res_pol0;
                    delays[s1] -= res_pol1;
                }
                None => warn!("Antenna {antenna} has {tuning} residual delays but no fixed delays; ignoring it"),
            }
        }
    }
}

/// The outcome of [`update_fixed_delays`].
#[derive(Debug, Clone)]
pub struct FixedDelaysUpdate {
    /// Where the updated table was written.
    pub output: PathBuf,

    /// The label of the reference antenna of the updated table.
    pub reference_antenna: String,

    pub delays: FixedDelays,
}

/// Apply the residual delays of one or both tunings to the fixed-delay table in
/// `fixed_delays_file`, and write the result beside it.
///
/// If `observed` isn't empty and the table's reference antenna isn't in it, a
/// new reference is selected from `priority` (skipping `exclusions`) and the
/// table is re-referenced before the residuals are applied.
///
/// The output is named "fixed_delay_<timestamp>.csv" with a suffix: "_BD" if
/// BD residuals were given, otherwise "_AC" (unless the input's name contains
/// "_BD", i.e. the BD tuning was already applied).
pub fn update_fixed_delays(
    fixed_delays_file: &Path,
    ac: Option<&DelaySolution>,
    bd: Option<&DelaySolution>,
    observed: &[u32],
    priority: &[u32],
    exclusions: &[u32],
) -> Result<FixedDelaysUpdate, FixedDelaysError> {
    if ac.is_none() && bd.is_none() {
        return Err(FixedDelaysError::NoResiduals);
    }

    let mut delays = FixedDelays::read_csv(fixed_delays_file)?;
    let mut reference = delays.find_reference()?;
    info!("Reference antenna of {}: {reference}", fixed_delays_file.display());

    let reference_observed = VisContext::parse_antenna_label(&reference)
        .map(|id| observed.contains(&id))
        .unwrap_or(false);
    if !observed.is_empty() && !reference_observed {
        let new_reference = VisContext::antenna_label(select_reference_antenna(
            priority, exclusions, observed,
        )?);
        warn!("Reference antenna {reference} was not observed; re-referencing to {new_reference}");
        delays.rereference(&new_reference)?;
        reference = new_reference;
    }

    let mut suffix = "";
    if let Some(ac) = ac {
        info!("Applying AC residual delays");
        delays.apply_residuals(Tuning::Ac, ac, &reference);
        let already_bd = fixed_delays_file
            .file_name()
            .map(|n| n.to_string_lossy().contains("_BD"))
            .unwrap_or(false);
        if !already_bd {
            suffix = "_AC";
        }
    }
    if let Some(bd) = bd {
        info!("Applying BD residual delays");
        delays.apply_residuals(Tuning::Bd, bd, &reference);
        suffix = "_BD";
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H%M%S%.6f");
    let output = fixed_delays_file
        .parent()
        .ok_or_else(|| FixedDelaysError::NoParent(fixed_delays_file.to_path_buf()))?
        .join(format!("fixed_delay_{timestamp}{suffix}.csv"));
    delays.write_csv(&output)?;
    info!("Wrote new fixed delays to {}", output.display());

    Ok(FixedDelaysUpdate {
        output,
        reference_antenna: reference,
        delays,
    })
}
