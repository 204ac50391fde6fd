//! Per-sample calculation chain.
//!
//! unit conversion -> cumulative distribution -> percentiles -> derived ratios
//!
//! Every step writes into the `SampleRecord`; on failure the derived fields
//! are left cleared so a half-computed record is never observable.

use crate::domain::{DesignFactors, SampleRecord, SieveUnit};
use crate::error::SandError;
use crate::sieve::distribution::build_cumulative;
use crate::sieve::percentiles::interpolate_percentiles;
use crate::sieve::ratios::{KeySizes, derive};
use crate::sieve::units::convert;

/// Recompute every derived field of `record` from its raw inputs.
///
/// Constien figures are cleared; they depend on the proppant selection and
/// are filled in by the batch pipeline.
pub fn calculate_sieve_parameters(
    record: &mut SampleRecord,
    unit: SieveUnit,
    factors: &DesignFactors,
) -> Result<(), SandError> {
    record.clear_derived();
    record.validate()?;

    let sizes = convert(&record.sieve_sizes, unit)?;
    let cumulative = build_cumulative(&record.name, &record.retained)?;
    let percentiles = interpolate_percentiles(&record.name, &cumulative, &sizes)?;
    let key = KeySizes::from_percentiles(&percentiles)
        .ok_or_else(|| SandError::degenerate(&record.name, "missing key percentile"))?;
    let stats = derive(&record.name, key, factors)?;

    record.sieve_sizes_micron = sizes;
    record.cumulative_wt_perc = cumulative;
    record.percentiles = Some(percentiles);
    record.statistics = Some(stats);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_sample() -> SampleRecord {
        SampleRecord::new(
            "S1",
            2450.0,
            vec![2000.0, 1000.0, 500.0, 250.0, 125.0, 63.0],
            vec![5.0, 15.0, 30.0, 30.0, 15.0, 5.0],
        )
    }

    #[test]
    fn end_to_end_reference_sample() {
        let mut sample = reference_sample();
        calculate_sieve_parameters(&mut sample, SieveUnit::Micron, &DesignFactors::default()).unwrap();

        let stats = sample.statistics.unwrap();
        assert!((stats.d50 - 500.0).abs() < 1e-9);
        assert!((stats.d10 - 5000.0 / 3.0).abs() < 1e-9);
        assert!((stats.d40 - 2000.0 / 3.0).abs() < 1e-9);
        assert!((stats.d90 - 500.0 / 3.0).abs() < 1e-9);
        assert!((stats.d95 - 125.0).abs() < 1e-9);
        assert!((stats.uniformity_coeff - 4.0).abs() < 1e-9);
        assert!((stats.sorting_factor - 40.0 / 3.0).abs() < 1e-9);
        assert!((stats.effective_size - 125.0).abs() < 1e-9);
        assert!((stats.mobile_fines_coeff - 4.0).abs() < 1e-9);
        assert!((stats.recommended_gravel_d50 - 3000.0).abs() < 1e-9);

        let expected = [5.0, 20.0, 50.0, 80.0, 95.0, 100.0];
        for (a, b) in sample.cumulative_wt_perc.iter().zip(expected) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(sample.constien_criterion, None);
    }

    #[test]
    fn recalculation_does_not_convert_twice() {
        let mut sample = SampleRecord::new(
            "mm",
            100.0,
            vec![2.0, 1.0, 0.5, 0.25],
            vec![10.0, 40.0, 40.0, 10.0],
        );
        let factors = DesignFactors::default();
        calculate_sieve_parameters(&mut sample, SieveUnit::Mm, &factors).unwrap();
        let first = sample.clone();
        calculate_sieve_parameters(&mut sample, SieveUnit::Mm, &factors).unwrap();
        assert_eq!(first, sample);
        assert_eq!(sample.sieve_sizes_micron, vec![2000.0, 1000.0, 500.0, 250.0]);
    }

    #[test]
    fn failure_leaves_derived_fields_cleared() {
        let mut sample = reference_sample();
        let factors = DesignFactors::default();
        calculate_sieve_parameters(&mut sample, SieveUnit::Micron, &factors).unwrap();

        sample.retained = vec![0.0; 6];
        let err = calculate_sieve_parameters(&mut sample, SieveUnit::Micron, &factors).unwrap_err();
        assert!(matches!(err, SandError::EmptySample { .. }));
        assert!(!sample.is_calculated());
        assert!(sample.cumulative_wt_perc.is_empty());
    }
}
