//! Cumulative weight-percent distribution.

use crate::error::SandError;

/// Running sum of retained weight, normalized to percent of the total.
///
/// `out[i] = 100 · Σ retained[0..=i] / Σ retained`, in the order given. The
/// last entry is exactly 100 when the total is positive. Negative weights are
/// not rejected here; they would make the curve non-monotone and are caught
/// by the percentile step.
pub fn build_cumulative(sample: &str, retained: &[f64]) -> Result<Vec<f64>, SandError> {
    let total: f64 = retained.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(SandError::EmptySample {
            name: sample.to_string(),
        });
    }

    let mut running = 0.0;
    Ok(retained
        .iter()
        .map(|w| {
            running += w;
            100.0 * running / total
        })
        .collect())
}
