//! Constien pack-pore screening and screen/proppant comparisons.

use crate::domain::{DesignFactors, ProppantReference, ScreenReference, SieveStatistics};
use crate::error::SandError;

/// `d50 / uniformity_coeff / proppant_pore_size`.
pub fn constien(d50: f64, uniformity_coeff: f64, proppant_pore_size: f64) -> f64 {
    d50 / uniformity_coeff / proppant_pore_size
}

/// Constien criterion of a processed sample against a proppant pack.
///
/// `proppant` is `None` when nothing was selected, which is `MissingProppant`.
pub fn constien_criterion(
    stats: &SieveStatistics,
    proppant: Option<&ProppantReference>,
    factors: &DesignFactors,
) -> Result<f64, SandError> {
    let proppant = proppant.ok_or(SandError::MissingProppant)?;
    let pore = proppant.pack_pore(factors).pore_size;
    if !(pore.is_finite() && pore > 0.0) {
        return Err(SandError::malformed(
            "proppant catalog",
            format!("proppant '{}' has no usable D50", proppant.name),
        ));
    }
    Ok(constien(stats.d50, stats.uniformity_coeff, pore))
}

/// A selected screen's aperture against the sample's D10.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenComparison {
    pub screen: String,
    pub aperture_micron: f64,
    /// aperture / D10.
    pub aperture_to_d10: f64,
}

/// A selected proppant's D50 against the sample's D50.
#[derive(Debug, Clone, PartialEq)]
pub struct ProppantComparison {
    pub proppant: String,
    pub d50_micron: f64,
    /// proppant D50 / sample D50.
    pub d50_ratio: f64,
    pub within_gravel_rule: bool,
    pub within_frac_rule: bool,
    pub constien: f64,
}

pub fn compare_screens(stats: &SieveStatistics, screens: &[&ScreenReference]) -> Vec<ScreenComparison> {
    screens
        .iter()
        .map(|s| ScreenComparison {
            screen: s.name.clone(),
            aperture_micron: s.aperture_micron,
            aperture_to_d10: s.aperture_micron / stats.d10,
        })
        .collect()
}

pub fn compare_proppants(
    stats: &SieveStatistics,
    proppants: &[&ProppantReference],
    factors: &DesignFactors,
) -> Vec<ProppantComparison> {
    proppants
        .iter()
        .map(|p| {
            let d50_ratio = p.d50_micron / stats.d50;
            ProppantComparison {
                proppant: p.name.clone(),
                d50_micron: p.d50_micron,
                d50_ratio,
                within_gravel_rule: d50_ratio <= factors.gravel_multiplier,
                within_frac_rule: d50_ratio <= factors.frac_multiplier,
                constien: constien(stats.d50, stats.uniformity_coeff, p.pack_pore(factors).pore_size),
            }
        })
        .collect()
}
