//! Session save/load.
//!
//! The JSON layout keeps the field names used by earlier versions of the
//! tool so existing session files still open:
//!
//! ```json
//! {
//!   "Sieve Units": "micron",
//!   "Selected Screen": ["WWS 150"],
//!   "Selected Proppant": ["Gravel 20/40"],
//!   "SRT Results": { "S1": { "Name": "S1", "Depth": 2450.0, "Sieve Sizes": [...], ... } },
//!   "Saved At": "2026-01-01T00:00:00Z"
//! }
//! ```
//!
//! Derived fields are written only for calculated samples. `"Sieve Sizes"`
//! holds the sizes as entered; files from before `"Sieve Sizes (micron)"`
//! existed stored converted micron sizes there for calculated samples, and
//! those are turned back into the file's unit on load.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::session::Session;
use crate::domain::{
    DesignFactors, GrainSizePercentiles, SampleRecord, SieveStatistics, SieveUnit, TARGET_PERCENTILES,
};
use crate::error::{AppError, SandError};
use crate::sieve::from_micron;

/// On-disk session document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(rename = "Sieve Units")]
    pub sieve_units: String,
    #[serde(rename = "Selected Screen", default)]
    pub selected_screens: Vec<String>,
    #[serde(rename = "Selected Proppant", default)]
    pub selected_proppants: Vec<String>,
    #[serde(rename = "SRT Results", default)]
    pub results: BTreeMap<String, SampleEntry>,
    #[serde(rename = "Saved At", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// One sample as stored in a session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Depth")]
    pub depth: f64,
    #[serde(rename = "Sieve Sizes")]
    pub sieve_sizes: Vec<f64>,
    #[serde(rename = "Retained Weight")]
    pub retained: Vec<f64>,
    #[serde(rename = "Sieve Sizes (micron)", default, skip_serializing_if = "Vec::is_empty")]
    pub sieve_sizes_micron: Vec<f64>,
    #[serde(rename = "Cumulative Weight Percentage", default)]
    pub cumulative_wt_perc: Vec<f64>,
    #[serde(rename = "Grain Size Percentiles", default, skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d40: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d90: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d95: Option<f64>,
    #[serde(rename = "UC", default, skip_serializing_if = "Option::is_none")]
    pub uniformity_coeff: Option<f64>,
    #[serde(rename = "Sorting", default, skip_serializing_if = "Option::is_none")]
    pub sorting_factor: Option<f64>,
    #[serde(rename = "Effective Size", default, skip_serializing_if = "Option::is_none")]
    pub effective_size: Option<f64>,
    #[serde(rename = "Mobile Fines Coefficient", default, skip_serializing_if = "Option::is_none")]
    pub mobile_fines_coeff: Option<f64>,
    #[serde(rename = "Mobile Fines Size", default, skip_serializing_if = "Option::is_none")]
    pub mobile_fines_size: Option<f64>,
    #[serde(rename = "Average Formation Pore Size", default, skip_serializing_if = "Option::is_none")]
    pub average_formation_pore: Option<f64>,
    #[serde(rename = "Smallest Particle to Bridge", default, skip_serializing_if = "Option::is_none")]
    pub smallest_particle_to_bridge: Option<f64>,
    #[serde(rename = "Largest Particle to Pass Through", default, skip_serializing_if = "Option::is_none")]
    pub largest_particle_thru_pore: Option<f64>,
    #[serde(rename = "Recommended Gravel D50", default, skip_serializing_if = "Option::is_none")]
    pub recommended_gravel_d50: Option<f64>,
    #[serde(rename = "Recommended Frac D50", default, skip_serializing_if = "Option::is_none")]
    pub recommended_frac_d50: Option<f64>,
    #[serde(rename = "Constien Criterion", default, skip_serializing_if = "Option::is_none")]
    pub constien_criterion: Option<f64>,
    #[serde(rename = "Constien By Proppant", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constien_by_proppant: BTreeMap<String, f64>,
}

impl SampleEntry {
    pub fn from_record(r: &SampleRecord) -> Self {
        let s = r.statistics;
        Self {
            name: r.name.clone(),
            depth: r.depth,
            sieve_sizes: r.sieve_sizes.clone(),
            retained: r.retained.clone(),
            sieve_sizes_micron: r.sieve_sizes_micron.clone(),
            cumulative_wt_perc: r.cumulative_wt_perc.clone(),
            percentiles: r.percentiles.map(|p| p.sizes.to_vec()),
            d5: s.map(|s| s.d5),
            d10: s.map(|s| s.d10),
            d40: s.map(|s| s.d40),
            d50: s.map(|s| s.d50),
            d90: s.map(|s| s.d90),
            d95: s.map(|s| s.d95),
            uniformity_coeff: s.map(|s| s.uniformity_coeff),
            sorting_factor: s.map(|s| s.sorting_factor),
            effective_size: s.map(|s| s.effective_size),
            mobile_fines_coeff: s.map(|s| s.mobile_fines_coeff),
            mobile_fines_size: s.map(|s| s.mobile_fines_size),
            average_formation_pore: s.map(|s| s.average_formation_pore),
            smallest_particle_to_bridge: s.map(|s| s.smallest_particle_to_bridge),
            largest_particle_thru_pore: s.map(|s| s.largest_particle_thru_pore),
            recommended_gravel_d50: s.map(|s| s.recommended_gravel_d50),
            recommended_frac_d50: s.map(|s| s.recommended_frac_d50),
            constien_criterion: r.constien_criterion,
            constien_by_proppant: r.constien_by_proppant.clone(),
        }
    }

    /// Rebuild the in-memory record.
    ///
    /// Statistics are restored only when every original statistic is present
    /// and the cumulative curve exists; files written before the recommended
    /// gravel/frac sizes were stored get them from `factors`.
    pub fn into_record(self, unit: SieveUnit, factors: &DesignFactors) -> Result<SampleRecord, SandError> {
        let calculated = !self.cumulative_wt_perc.is_empty();
        let statistics = if calculated {
            restore_statistics(&stored_stats(&self), factors)
        } else {
            None
        };

        let (raw_sizes, micron_sizes) = if calculated && self.sieve_sizes_micron.is_empty() {
            let raw = self
                .sieve_sizes
                .iter()
                .map(|&v| from_micron(v, unit))
                .collect::<Result<Vec<_>, _>>()?;
            (raw, self.sieve_sizes)
        } else {
            (self.sieve_sizes, self.sieve_sizes_micron)
        };

        let mut record = SampleRecord::new(self.name, self.depth, raw_sizes, self.retained);
        record.validate()?;
        let Some(statistics) = statistics else {
            return Ok(record);
        };

        let percentiles = match self.percentiles {
            Some(sizes) => Some(to_percentiles(&record.name, sizes)?),
            None => None,
        };

        record.sieve_sizes_micron = micron_sizes;
        record.cumulative_wt_perc = self.cumulative_wt_perc;
        record.percentiles = percentiles;
        record.statistics = Some(statistics);
        record.constien_criterion = self.constien_criterion;
        record.constien_by_proppant = self.constien_by_proppant;
        Ok(record)
    }
}

/// The statistic fields of an entry, in `SieveStatistics` order.
struct StoredStats {
    required: [Option<f64>; 14],
    gravel: Option<f64>,
    frac: Option<f64>,
}

fn stored_stats(e: &SampleEntry) -> StoredStats {
    StoredStats {
        required: [
            e.d5,
            e.d10,
            e.d40,
            e.d50,
            e.d90,
            e.d95,
            e.uniformity_coeff,
            e.sorting_factor,
            e.effective_size,
            e.mobile_fines_coeff,
            e.mobile_fines_size,
            e.average_formation_pore,
            e.smallest_particle_to_bridge,
            e.largest_particle_thru_pore,
        ],
        gravel: e.recommended_gravel_d50,
        frac: e.recommended_frac_d50,
    }
}

fn restore_statistics(stored: &StoredStats, factors: &DesignFactors) -> Option<SieveStatistics> {
    let mut v = [0.0; 14];
    for (slot, value) in v.iter_mut().zip(stored.required) {
        *slot = value?;
    }
    let [d5, d10, d40, d50, d90, d95, uc, sorting, effective, mfc, mfs, pore, bridge, thru] = v;
    Some(SieveStatistics {
        d5,
        d10,
        d40,
        d50,
        d90,
        d95,
        uniformity_coeff: uc,
        sorting_factor: sorting,
        effective_size: effective,
        mobile_fines_coeff: mfc,
        mobile_fines_size: mfs,
        average_formation_pore: pore,
        smallest_particle_to_bridge: bridge,
        largest_particle_thru_pore: thru,
        recommended_gravel_d50: stored.gravel.unwrap_or(d50 * factors.gravel_multiplier),
        recommended_frac_d50: stored.frac.unwrap_or(d50 * factors.frac_multiplier),
    })
}

fn to_percentiles(sample: &str, sizes: Vec<f64>) -> Result<GrainSizePercentiles, SandError> {
    let sizes: [f64; TARGET_PERCENTILES.len()] = sizes.try_into().map_err(|v: Vec<f64>| {
        SandError::invalid_sample(
            sample,
            format!(
                "expected {} grain size percentiles, found {}",
                TARGET_PERCENTILES.len(),
                v.len()
            ),
        )
    })?;
    Ok(GrainSizePercentiles { sizes })
}

/// Session contents read back from disk.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub unit: SieveUnit,
    pub samples: BTreeMap<String, SampleRecord>,
    pub selected_screens: Vec<String>,
    pub selected_proppants: Vec<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionFile {
    pub fn from_session(session: &Session, saved_at: DateTime<Utc>) -> Self {
        Self {
            sieve_units: session.sieve_unit.token().to_string(),
            selected_screens: session.selected_screens.clone(),
            selected_proppants: session.selected_proppants.clone(),
            results: session
                .samples
                .iter()
                .map(|(k, r)| (k.clone(), SampleEntry::from_record(r)))
                .collect(),
            saved_at: Some(saved_at),
        }
    }

    pub fn into_loaded(self, factors: &DesignFactors) -> Result<LoadedSession, SandError> {
        let unit: SieveUnit = self.sieve_units.parse()?;
        let samples = self
            .results
            .into_iter()
            .map(|(key, entry)| {
                if key != entry.name {
                    return Err(SandError::malformed(
                        "session file",
                        format!("entry '{key}' is named '{}'", entry.name),
                    ));
                }
                Ok((key, entry.into_record(unit, factors)?))
            })
            .collect::<Result<BTreeMap<_, _>, SandError>>()?;
        Ok(LoadedSession {
            unit,
            samples,
            selected_screens: self.selected_screens,
            selected_proppants: self.selected_proppants,
            saved_at: self.saved_at,
        })
    }
}

/// Write the session to `path` as pretty-printed JSON.
pub fn save_session(path: &Path, session: &Session) -> Result<(), AppError> {
    let doc = SessionFile::from_session(session, Utc::now());
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create session file '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write session JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write session JSON: {e}")))?;
    info!(path = %path.display(), samples = doc.results.len(), "session saved");
    Ok(())
}

/// Read a session file.
pub fn load_session(path: &Path, factors: &DesignFactors) -> Result<LoadedSession, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open session file '{}': {e}", path.display())))?;
    let doc: SessionFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SandError::malformed(path.display().to_string(), e.to_string()))?;
    let loaded = doc.into_loaded(factors)?;
    info!(
        path = %path.display(),
        samples = loaded.samples.len(),
        unit = %loaded.unit,
        "session loaded"
    );
    Ok(loaded)
}
