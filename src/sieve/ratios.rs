//! Derived engineering ratios from the key percentile sizes.

use crate::domain::{DesignFactors, GrainSizePercentiles, SieveStatistics};
use crate::error::SandError;

/// The six percentile sizes the ratios are built from (micron).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySizes {
    pub d5: f64,
    pub d10: f64,
    pub d40: f64,
    pub d50: f64,
    pub d90: f64,
    pub d95: f64,
}

impl KeySizes {
    pub fn from_percentiles(p: &GrainSizePercentiles) -> Option<Self> {
        Some(Self {
            d5: p.at(5.0)?,
            d10: p.at(10.0)?,
            d40: p.at(40.0)?,
            d50: p.at(50.0)?,
            d90: p.at(90.0)?,
            d95: p.at(95.0)?,
        })
    }
}

/// Compute uniformity, sorting, mobile-fines and pore/bridging figures.
///
/// Fails with `DegenerateDistribution` when a denominator (D90, D95, or D40
/// through the uniformity coefficient) is zero or any input is not finite.
pub fn derive(sample: &str, d: KeySizes, factors: &DesignFactors) -> Result<SieveStatistics, SandError> {
    let all = [d.d5, d.d10, d.d40, d.d50, d.d90, d.d95];
    if all.iter().any(|v| !v.is_finite()) {
        return Err(SandError::degenerate(sample, "non-finite percentile size"));
    }
    if d.d90 == 0.0 {
        return Err(SandError::degenerate(sample, "D90 is zero (uniformity coefficient undefined)"));
    }
    if d.d95 == 0.0 {
        return Err(SandError::degenerate(
            sample,
            "D95 is zero (sorting factor and mobile fines coefficient undefined)",
        ));
    }

    let uniformity_coeff = d.d40 / d.d90;
    if uniformity_coeff == 0.0 {
        return Err(SandError::degenerate(sample, "D40 is zero (effective size undefined)"));
    }

    let average_formation_pore = d.d50 / factors.pore_divisor;

    Ok(SieveStatistics {
        d5: d.d5,
        d10: d.d10,
        d40: d.d40,
        d50: d.d50,
        d90: d.d90,
        d95: d.d95,
        uniformity_coeff,
        sorting_factor: d.d10 / d.d95,
        effective_size: d.d50 / uniformity_coeff,
        mobile_fines_coeff: d.d50 / d.d95,
        mobile_fines_size: d.d50 / factors.mobile_fines_divisor,
        average_formation_pore,
        smallest_particle_to_bridge: average_formation_pore / factors.bridge_divisor,
        largest_particle_thru_pore: average_formation_pore / factors.pass_through_divisor,
        recommended_gravel_d50: d.d50 * factors.gravel_multiplier,
        recommended_frac_d50: d.d50 * factors.frac_multiplier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(d40: f64, d50: f64, d90: f64, d95: f64) -> KeySizes {
        KeySizes {
            d5: 1200.0,
            d10: 1000.0,
            d40,
            d50,
            d90,
            d95,
        }
    }

    #[test]
    fn uniformity_and_effective_size() {
        let s = derive("S1", sizes(250.0, 300.0, 1000.0, 500.0), &DesignFactors::default()).unwrap();
        assert!((s.uniformity_coeff - 0.25).abs() < 1e-12);
        assert!((s.effective_size - 1200.0).abs() < 1e-9);
        assert!((s.sorting_factor - 2.0).abs() < 1e-12);
        assert!((s.mobile_fines_coeff - 0.6).abs() < 1e-12);
    }

    #[test]
    fn pore_and_recommendation_figures() {
        let s = derive("S1", sizes(600.0, 650.0, 200.0, 100.0), &DesignFactors::default()).unwrap();
        assert!((s.mobile_fines_size - 65.0).abs() < 1e-9);
        assert!((s.average_formation_pore - 100.0).abs() < 1e-9);
        assert!((s.smallest_particle_to_bridge - 100.0 / 3.0).abs() < 1e-9);
        assert!((s.largest_particle_thru_pore - 100.0 / 7.0).abs() < 1e-9);
        assert!((s.recommended_gravel_d50 - 3900.0).abs() < 1e-9);
        assert!((s.recommended_frac_d50 - 5200.0).abs() < 1e-9);
    }

    #[test]
    fn zero_denominators_are_degenerate() {
        let f = DesignFactors::default();
        assert!(matches!(
            derive("S1", sizes(250.0, 300.0, 0.0, 500.0), &f),
            Err(SandError::DegenerateDistribution { .. })
        ));
        assert!(matches!(
            derive("S1", sizes(250.0, 300.0, 100.0, 0.0), &f),
            Err(SandError::DegenerateDistribution { .. })
        ));
        assert!(matches!(
            derive("S1", sizes(0.0, 300.0, 100.0, 50.0), &f),
            Err(SandError::DegenerateDistribution { .. })
        ));
    }
}
