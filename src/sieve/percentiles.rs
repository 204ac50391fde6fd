//! Percentile grain sizes (D5 … D95) from the cumulative curve.

use crate::domain::{GrainSizePercentiles, TARGET_PERCENTILES};
use crate::error::SandError;
use crate::math::{interp, is_non_decreasing};

/// Interpolate the grain size at each target percentile.
///
/// `cumulative` is the independent variable and must be non-decreasing in the
/// order supplied; `sizes` are the matching sieve sizes in micron.
pub fn interpolate_percentiles(
    sample: &str,
    cumulative: &[f64],
    sizes: &[f64],
) -> Result<GrainSizePercentiles, SandError> {
    if cumulative.is_empty() || cumulative.len() != sizes.len() {
        return Err(SandError::invalid_sample(
            sample,
            format!(
                "cumulative curve has {} points but there are {} sieve sizes",
                cumulative.len(),
                sizes.len()
            ),
        ));
    }
    if !is_non_decreasing(cumulative) {
        return Err(SandError::invalid_sample(
            sample,
            "cumulative weight percent decreases (negative retained weight?)",
        ));
    }

    let mut out = [0.0; TARGET_PERCENTILES.len()];
    for (slot, &pct) in out.iter_mut().zip(TARGET_PERCENTILES.iter()) {
        // Lengths were checked above, so interpolation always yields a value.
        *slot = interp(pct, cumulative, sizes).unwrap_or(f64::NAN);
    }
    Ok(GrainSizePercentiles { sizes: out })
}
