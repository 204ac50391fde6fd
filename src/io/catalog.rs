//! Screen and proppant reference catalogs (JSON maps keyed by name).
//!
//! Screens:
//!
//! ```json
//! { "WWS 150": { "name": "WWS 150", "type": "WWS", "aperture_micron": 150 } }
//! ```
//!
//! Proppants:
//!
//! ```json
//! { "Gravel 20/40": { "name": "Gravel 20/40", "permeability_D": 120, "density_SG": 2.65,
//!   "absvol_gal/lb": 0.0453, "bulk_density_lb/ft3": 100, "D50_micron": 650 } }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::domain::{ProppantCatalog, ProppantReference, ScreenCatalog, ScreenReference};
use crate::error::{AppError, SandError};

pub fn load_screen_catalog(path: &Path) -> Result<ScreenCatalog, AppError> {
    let source = path.display().to_string();
    let catalog = parse_screen_catalog(open(path, "screen database")?, &source)?;
    info!(source = %source, screens = catalog.len(), "screen catalog loaded");
    Ok(catalog)
}

pub fn load_proppant_catalog(path: &Path) -> Result<ProppantCatalog, AppError> {
    let source = path.display().to_string();
    let catalog = parse_proppant_catalog(open(path, "proppant database")?, &source)?;
    info!(source = %source, proppants = catalog.len(), "proppant catalog loaded");
    Ok(catalog)
}

pub fn parse_screen_catalog<R: Read>(reader: R, source: &str) -> Result<ScreenCatalog, SandError> {
    let entries: BTreeMap<String, ScreenReference> = parse_entries(reader, source)?;
    for (key, screen) in &entries {
        check_name(source, key, &screen.name)?;
        check_positive(source, key, "aperture_micron", screen.aperture_micron)?;
    }
    Ok(entries)
}

pub fn parse_proppant_catalog<R: Read>(reader: R, source: &str) -> Result<ProppantCatalog, SandError> {
    let entries: BTreeMap<String, ProppantReference> = parse_entries(reader, source)?;
    for (key, proppant) in &entries {
        check_name(source, key, &proppant.name)?;
        check_positive(source, key, "D50_micron", proppant.d50_micron)?;
    }
    Ok(entries)
}

fn open(path: &Path, what: &str) -> Result<BufReader<File>, AppError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| AppError::new(2, format!("Failed to open {what} '{}': {e}", path.display())))
}

/// Decode the top-level map entry by entry so errors name the offending key.
fn parse_entries<R: Read, T: DeserializeOwned>(reader: R, source: &str) -> Result<BTreeMap<String, T>, SandError> {
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_reader(reader).map_err(|e| SandError::malformed(source, e.to_string()))?;

    raw.into_iter()
        .map(|(key, value)| {
            let entry = serde_json::from_value(value)
                .map_err(|e| SandError::malformed(source, format!("entry '{key}': {e}")))?;
            Ok((key, entry))
        })
        .collect()
}

fn check_name(source: &str, key: &str, name: &str) -> Result<(), SandError> {
    if name.trim().is_empty() {
        return Err(SandError::malformed(source, format!("entry '{key}' has an empty name")));
    }
    Ok(())
}

fn check_positive(source: &str, key: &str, field: &str, value: f64) -> Result<(), SandError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(SandError::malformed(
            source,
            format!("entry '{key}': `{field}` must be finite and > 0 (got {value})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_catalog_round_trips_field_names() {
        let json = r#"{
            "WWS 150": {"name": "WWS 150", "type": "WWS", "aperture_micron": 150},
            "PMM 200": {"name": "PMM 200", "type": "Premium", "aperture_micron": 200.5}
        }"#;
        let catalog = parse_screen_catalog(json.as_bytes(), "screens.json").unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["PMM 200"].kind, "Premium");
        assert_eq!(catalog["PMM 200"].aperture_micron, 200.5);
    }

    #[test]
    fn proppant_catalog_reads_unit_suffixed_keys() {
        let json = r#"{"Gravel 20/40": {"name": "Gravel 20/40", "permeability_D": 120,
            "density_SG": 2.65, "absvol_gal/lb": 0.0453, "bulk_density_lb/ft3": 100, "D50_micron": 650}}"#;
        let catalog = parse_proppant_catalog(json.as_bytes(), "proppants.json").unwrap();
        let p = &catalog["Gravel 20/40"];
        assert_eq!(p.d50_micron, 650.0);
        assert_eq!(p.abs_volume_gal_per_lb, 0.0453);
    }

    #[test]
    fn missing_fields_are_malformed() {
        let json = r#"{"Bad": {"name": "Bad", "type": "WWS"}}"#;
        let err = parse_screen_catalog(json.as_bytes(), "screens.json").unwrap_err();
        match err {
            SandError::MalformedRecord { source_name, reason } => {
                assert_eq!(source_name, "screens.json");
                assert!(reason.contains("'Bad'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_positive_d50_is_malformed() {
        let json = r#"{"Zero": {"name": "Zero", "permeability_D": 1, "density_SG": 2.65,
            "absvol_gal/lb": 0.04, "bulk_density_lb/ft3": 100, "D50_micron": 0}}"#;
        assert!(matches!(
            parse_proppant_catalog(json.as_bytes(), "p.json"),
            Err(SandError::MalformedRecord { .. })
        ));
    }
}
