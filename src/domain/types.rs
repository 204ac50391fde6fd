//! Shared domain types.
//!
//! These types are kept lightweight so they can be:
//!
//! - mutated in-memory by the session and batch pipeline
//! - persisted to the session JSON file and exported to CSV
//! - reloaded later for reporting and plotting

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SandError;

/// Unit in which sieve aperture sizes are supplied.
///
/// Everything downstream of the unit converter works in micron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum SieveUnit {
    #[default]
    Micron,
    Mm,
    In,
    Phi,
    /// US standard sieve series mesh number.
    Mesh,
}

impl SieveUnit {
    pub const ALL: [SieveUnit; 5] = [
        SieveUnit::Micron,
        SieveUnit::Mm,
        SieveUnit::In,
        SieveUnit::Phi,
        SieveUnit::Mesh,
    ];

    /// Token used in files and prompts.
    pub fn token(self) -> &'static str {
        match self {
            SieveUnit::Micron => "micron",
            SieveUnit::Mm => "mm",
            SieveUnit::In => "in",
            SieveUnit::Phi => "phi",
            SieveUnit::Mesh => "mesh",
        }
    }
}

impl fmt::Display for SieveUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for SieveUnit {
    type Err = SandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "micron" | "microns" | "um" | "µm" => Ok(SieveUnit::Micron),
            "mm" | "millimeter" | "millimetre" => Ok(SieveUnit::Mm),
            "in" | "inch" | "inches" => Ok(SieveUnit::In),
            "phi" => Ok(SieveUnit::Phi),
            "mesh" => Ok(SieveUnit::Mesh),
            _ => Err(SandError::UnsupportedUnit(s.trim().to_string())),
        }
    }
}

/// Engineering constants used by the derived-ratio and pore calculations.
///
/// Defaults follow the common sand-control rules of thumb: average pore
/// throat = D50 / 6.5, bridging at a third of the pore, passing through at a
/// seventh, gravel D50 = 6 × formation D50 and frac proppant D50 = 8 × D50.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignFactors {
    pub pore_divisor: f64,
    pub bridge_divisor: f64,
    pub pass_through_divisor: f64,
    pub mobile_fines_divisor: f64,
    pub gravel_multiplier: f64,
    pub frac_multiplier: f64,
}

impl Default for DesignFactors {
    fn default() -> Self {
        Self {
            pore_divisor: 6.5,
            bridge_divisor: 3.0,
            pass_through_divisor: 7.0,
            mobile_fines_divisor: 10.0,
            gravel_multiplier: 6.0,
            frac_multiplier: 8.0,
        }
    }
}

impl DesignFactors {
    pub fn validate(&self) -> Result<(), SandError> {
        let fields = [
            ("pore_divisor", self.pore_divisor),
            ("bridge_divisor", self.bridge_divisor),
            ("pass_through_divisor", self.pass_through_divisor),
            ("mobile_fines_divisor", self.mobile_fines_divisor),
            ("gravel_multiplier", self.gravel_multiplier),
            ("frac_multiplier", self.frac_multiplier),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(SandError::malformed(
                    "design factors",
                    format!("`{name}` must be finite and > 0 (got {value})"),
                ));
            }
        }
        Ok(())
    }
}

/// Percentiles at which grain sizes are interpolated.
pub const TARGET_PERCENTILES: [f64; 11] = [5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0];

/// Grain size (micron) at each of [`TARGET_PERCENTILES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSizePercentiles {
    pub sizes: [f64; 11],
}

impl GrainSizePercentiles {
    /// Size at percentile `pct`, if `pct` is one of the target percentiles.
    pub fn at(&self, pct: f64) -> Option<f64> {
        TARGET_PERCENTILES
            .iter()
            .position(|&p| (p - pct).abs() < 1e-9)
            .map(|idx| self.sizes[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        TARGET_PERCENTILES.iter().copied().zip(self.sizes.iter().copied())
    }
}

/// Derived grain-size statistics for one sample (all sizes in micron).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SieveStatistics {
    pub d5: f64,
    pub d10: f64,
    pub d40: f64,
    pub d50: f64,
    pub d90: f64,
    pub d95: f64,
    /// D40 / D90.
    pub uniformity_coeff: f64,
    /// D10 / D95.
    pub sorting_factor: f64,
    /// D50 / uniformity coefficient.
    pub effective_size: f64,
    /// D50 / D95.
    pub mobile_fines_coeff: f64,
    pub mobile_fines_size: f64,
    pub average_formation_pore: f64,
    pub smallest_particle_to_bridge: f64,
    pub largest_particle_thru_pore: f64,
    pub recommended_gravel_d50: f64,
    pub recommended_frac_d50: f64,
}

/// One sieve retention test: raw inputs plus everything derived from them.
///
/// Derived fields are `None`/empty until the sample has been processed; a
/// failed calculation leaves them cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub name: String,
    pub depth: f64,
    /// Sieve sizes as supplied, in the session's sieve unit.
    pub sieve_sizes: Vec<f64>,
    /// Retained weight at each sieve, parallel to `sieve_sizes`.
    pub retained: Vec<f64>,
    pub sieve_sizes_micron: Vec<f64>,
    pub cumulative_wt_perc: Vec<f64>,
    pub percentiles: Option<GrainSizePercentiles>,
    pub statistics: Option<SieveStatistics>,
    /// Constien criterion against the first selected proppant.
    pub constien_criterion: Option<f64>,
    /// Constien criterion against every selected proppant.
    pub constien_by_proppant: BTreeMap<String, f64>,
}

impl SampleRecord {
    pub fn new(name: impl Into<String>, depth: f64, sieve_sizes: Vec<f64>, retained: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            depth,
            sieve_sizes,
            retained,
            sieve_sizes_micron: Vec::new(),
            cumulative_wt_perc: Vec::new(),
            percentiles: None,
            statistics: None,
            constien_criterion: None,
            constien_by_proppant: BTreeMap::new(),
        }
    }

    /// Check the raw-input invariants: equal-length, non-empty, finite.
    pub fn validate(&self) -> Result<(), SandError> {
        if self.sieve_sizes.is_empty() {
            return Err(SandError::invalid_sample(&self.name, "no sieve sizes"));
        }
        if self.sieve_sizes.len() != self.retained.len() {
            return Err(SandError::invalid_sample(
                &self.name,
                format!(
                    "{} sieve sizes but {} retained weights",
                    self.sieve_sizes.len(),
                    self.retained.len()
                ),
            ));
        }
        if self.sieve_sizes.iter().chain(self.retained.iter()).any(|v| !v.is_finite()) {
            return Err(SandError::invalid_sample(&self.name, "non-finite sieve size or weight"));
        }
        if !self.depth.is_finite() {
            return Err(SandError::invalid_sample(&self.name, "non-finite depth"));
        }
        Ok(())
    }

    pub fn clear_derived(&mut self) {
        self.sieve_sizes_micron.clear();
        self.cumulative_wt_perc.clear();
        self.percentiles = None;
        self.statistics = None;
        self.constien_criterion = None;
        self.constien_by_proppant.clear();
    }

    pub fn is_calculated(&self) -> bool {
        self.statistics.is_some()
    }

    /// Micron sizes when calculated, otherwise the raw sizes.
    pub fn plot_sizes(&self) -> &[f64] {
        if self.sieve_sizes_micron.len() == self.sieve_sizes.len() {
            &self.sieve_sizes_micron
        } else {
            &self.sieve_sizes
        }
    }
}

/// A catalogued sand-control screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReference {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub aperture_micron: f64,
}

/// A catalogued gravel / frac proppant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProppantReference {
    pub name: String,
    #[serde(rename = "permeability_D")]
    pub permeability_d: f64,
    #[serde(rename = "density_SG")]
    pub density_sg: f64,
    #[serde(rename = "absvol_gal/lb")]
    pub abs_volume_gal_per_lb: f64,
    #[serde(rename = "bulk_density_lb/ft3")]
    pub bulk_density_lb_ft3: f64,
    #[serde(rename = "D50_micron")]
    pub d50_micron: f64,
}

/// Pore-throat sizes of a packed proppant bed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackPore {
    pub pore_size: f64,
    pub smallest_particle_to_bridge: f64,
    pub largest_particle_thru_pore: f64,
}

impl ProppantReference {
    pub fn pack_pore(&self, factors: &DesignFactors) -> PackPore {
        let pore_size = self.d50_micron / factors.pore_divisor;
        PackPore {
            pore_size,
            smallest_particle_to_bridge: pore_size / factors.bridge_divisor,
            largest_particle_thru_pore: pore_size / factors.pass_through_divisor,
        }
    }
}

pub type ScreenCatalog = BTreeMap<String, ScreenReference>;
pub type ProppantCatalog = BTreeMap<String, ProppantReference>;

/// A full run's configuration as understood by the `analyze` command.
///
/// This is derived from CLI flags plus environment settings.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub sieve_paths: Vec<PathBuf>,
    pub unit: SieveUnit,
    pub screen_db: PathBuf,
    pub proppant_db: PathBuf,
    pub screens: Vec<String>,
    pub proppants: Vec<String>,
    pub design: DesignFactors,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub save: Option<PathBuf>,
    pub export_results: Option<PathBuf>,
    pub export_figure: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sieve_unit_parses_aliases_and_rejects_unknown_tokens() {
        assert_eq!("micron".parse::<SieveUnit>(), Ok(SieveUnit::Micron));
        assert_eq!(" MM ".parse::<SieveUnit>(), Ok(SieveUnit::Mm));
        assert_eq!("inch".parse::<SieveUnit>(), Ok(SieveUnit::In));
        assert_eq!("Phi".parse::<SieveUnit>(), Ok(SieveUnit::Phi));
        assert_eq!("mesh".parse::<SieveUnit>(), Ok(SieveUnit::Mesh));
        assert_eq!(
            "furlong".parse::<SieveUnit>(),
            Err(SandError::UnsupportedUnit("furlong".to_string()))
        );
    }

    #[test]
    fn validate_rejects_mismatched_lengths() {
        let sample = SampleRecord::new("S1", 1000.0, vec![500.0, 250.0], vec![1.0]);
        assert!(matches!(sample.validate(), Err(SandError::InvalidSample { .. })));

        let empty = SampleRecord::new("S2", 1000.0, vec![], vec![]);
        assert!(matches!(empty.validate(), Err(SandError::InvalidSample { .. })));
    }

    #[test]
    fn proppant_pack_pore_uses_design_factors() {
        let proppant = ProppantReference {
            name: "Gravel 20/40".to_string(),
            permeability_d: 120.0,
            density_sg: 2.65,
            abs_volume_gal_per_lb: 0.0453,
            bulk_density_lb_ft3: 100.0,
            d50_micron: 650.0,
        };
        let pore = proppant.pack_pore(&DesignFactors::default());
        assert!((pore.pore_size - 100.0).abs() < 1e-9);
        assert!((pore.smallest_particle_to_bridge - 100.0 / 3.0).abs() < 1e-9);
        assert!((pore.largest_particle_thru_pore - 100.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn percentile_lookup_by_value() {
        let table = GrainSizePercentiles {
            sizes: [11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        };
        assert_eq!(table.at(50.0), Some(6.0));
        assert_eq!(table.at(95.0), Some(1.0));
        assert_eq!(table.at(55.0), None);
    }
}
