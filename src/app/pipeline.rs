//! Shared batch pipeline used by the CLI commands, the menu and the viewer.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! catalogs -> sieve import -> per-sample calculation -> Constien screening
//!
//! Front-ends then only deal with presentation (printing, plotting, widgets).

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::app::session::Session;
use crate::domain::{AnalysisConfig, DesignFactors, ProppantCatalog, ProppantReference, SampleRecord, SieveUnit};
use crate::error::{AppError, RecordKind, SandError};
use crate::sieve::{calculate_sieve_parameters, constien_criterion};

/// A sample whose calculation failed, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFailure {
    pub sample: String,
    pub error: SandError,
}

/// Result of processing a whole collection of samples.
///
/// Every input sample is present in `samples`; failed ones keep their raw
/// inputs with derived fields cleared and are listed in `failures`.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub samples: BTreeMap<String, SampleRecord>,
    pub failures: Vec<SampleFailure>,
}

/// Process every sample independently.
///
/// The Constien criterion uses the first of `selected_proppants`; the
/// per-proppant map covers all of them. Unknown proppant names fail the whole
/// batch before any sample is touched.
pub fn process_all(
    unit: SieveUnit,
    samples: &BTreeMap<String, SampleRecord>,
    proppant_catalog: &ProppantCatalog,
    selected_proppants: &[String],
    factors: &DesignFactors,
) -> Result<BatchOutput, SandError> {
    factors.validate()?;
    let proppants = resolve_proppants(proppant_catalog, selected_proppants)?;

    let results: Vec<(String, Result<SampleRecord, SandError>)> = samples
        .par_iter()
        .map(|(name, record)| (name.clone(), process_sample(record, unit, &proppants, factors)))
        .collect();

    let mut out = BTreeMap::new();
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(record) => {
                debug!(sample = %name, "sample processed");
                out.insert(name, record);
            }
            Err(error) => {
                warn!(sample = %name, error = %error, "sample calculation failed");
                if let Some(original) = samples.get(&name) {
                    let mut cleared = original.clone();
                    cleared.clear_derived();
                    out.insert(name.clone(), cleared);
                }
                failures.push(SampleFailure { sample: name, error });
            }
        }
    }

    info!(
        samples = out.len(),
        failed = failures.len(),
        unit = %unit,
        proppant = selected_proppants.first().map(String::as_str).unwrap_or("-"),
        "batch calculation finished"
    );

    Ok(BatchOutput {
        samples: out,
        failures,
    })
}

fn resolve_proppants<'a>(
    catalog: &'a ProppantCatalog,
    selected: &[String],
) -> Result<Vec<&'a ProppantReference>, SandError> {
    selected
        .iter()
        .map(|name| {
            catalog
                .get(name)
                .ok_or_else(|| SandError::not_found(RecordKind::Proppant, name))
        })
        .collect()
}

fn process_sample(
    record: &SampleRecord,
    unit: SieveUnit,
    proppants: &[&ProppantReference],
    factors: &DesignFactors,
) -> Result<SampleRecord, SandError> {
    let mut out = record.clone();
    calculate_sieve_parameters(&mut out, unit, factors)?;

    let Some(stats) = out.statistics else {
        return Ok(out);
    };
    for proppant in proppants {
        let value = constien_criterion(&stats, Some(proppant), factors)?;
        out.constien_by_proppant.insert(proppant.name.clone(), value);
    }
    out.constien_criterion = proppants
        .first()
        .and_then(|p| out.constien_by_proppant.get(&p.name).copied());
    Ok(out)
}

/// Execute the non-interactive `analyze` workflow and return the session.
pub fn run_analysis(config: &AnalysisConfig) -> Result<Session, AppError> {
    let screens = crate::io::catalog::load_screen_catalog(&config.screen_db)?;
    let proppants = crate::io::catalog::load_proppant_catalog(&config.proppant_db)?;

    let mut session = Session::new(screens, proppants, config.design);
    session.set_unit(config.unit);

    for path in &config.sieve_paths {
        let ingest = crate::io::ingest::load_sieve_file(path)?;
        if !ingest.row_errors.is_empty() {
            eprintln!("{}", crate::report::format_row_errors(&ingest));
        }
        session.append_samples(ingest.samples);
    }

    for name in &config.screens {
        session.select_screen(name)?;
    }
    for name in &config.proppants {
        session.select_proppant(name)?;
    }

    session.calculate()?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ProppantCatalog {
        let mut c = ProppantCatalog::new();
        for (name, d50) in [("Gravel 20/40", 650.0), ("Carbolite 20/40", 2000.0)] {
            c.insert(
                name.to_string(),
                ProppantReference {
                    name: name.to_string(),
                    permeability_d: 150.0,
                    density_sg: 2.7,
                    abs_volume_gal_per_lb: 0.044,
                    bulk_density_lb_ft3: 98.0,
                    d50_micron: d50,
                },
            );
        }
        c
    }

    fn samples() -> BTreeMap<String, SampleRecord> {
        let sizes = vec![2000.0, 1000.0, 500.0, 250.0, 125.0, 63.0];
        let mut m = BTreeMap::new();
        m.insert(
            "Good".to_string(),
            SampleRecord::new("Good", 2450.0, sizes.clone(), vec![5.0, 15.0, 30.0, 30.0, 15.0, 5.0]),
        );
        m.insert(
            "Empty".to_string(),
            SampleRecord::new("Empty", 2460.0, sizes, vec![0.0; 6]),
        );
        m
    }

    #[test]
    fn failures_are_isolated_per_sample() {
        let out = process_all(
            SieveUnit::Micron,
            &samples(),
            &catalog(),
            &["Gravel 20/40".to_string()],
            &DesignFactors::default(),
        )
        .unwrap();

        assert_eq!(out.samples.len(), 2);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].sample, "Empty");
        assert!(matches!(out.failures[0].error, SandError::EmptySample { .. }));

        let good = &out.samples["Good"];
        assert!(good.is_calculated());
        // d50 = 500, uc = 4, pore = 650 / 6.5 = 100
        assert!((good.constien_criterion.unwrap() - 1.25).abs() < 1e-9);
        assert!(!out.samples["Empty"].is_calculated());
    }

    #[test]
    fn constien_uses_first_selected_and_maps_all() {
        let selected = vec!["Carbolite 20/40".to_string(), "Gravel 20/40".to_string()];
        let out = process_all(SieveUnit::Micron, &samples(), &catalog(), &selected, &DesignFactors::default()).unwrap();
        let good = &out.samples["Good"];
        let first = good.constien_by_proppant["Carbolite 20/40"];
        assert_eq!(good.constien_criterion, Some(first));
        assert_eq!(good.constien_by_proppant.len(), 2);
    }

    #[test]
    fn no_selection_leaves_constien_absent() {
        let out = process_all(SieveUnit::Micron, &samples(), &catalog(), &[], &DesignFactors::default()).unwrap();
        assert_eq!(out.samples["Good"].constien_criterion, None);
        assert!(out.samples["Good"].constien_by_proppant.is_empty());
    }

    #[test]
    fn unknown_proppant_fails_the_batch() {
        let err = process_all(
            SieveUnit::Micron,
            &samples(),
            &catalog(),
            &["Nope".to_string()],
            &DesignFactors::default(),
        )
        .unwrap_err();
        assert_eq!(err, SandError::not_found(RecordKind::Proppant, "Nope"));
    }
}
