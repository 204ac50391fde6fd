//! Explicit session context shared by the menu, the commands and the viewer.
//!
//! A session owns everything the interactive tool works on: the sieve unit,
//! the sample collection, both catalogs, the current selections and the
//! design factors. Front-ends mutate it through the methods below.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::app::pipeline::{SampleFailure, process_all};
use crate::domain::{
    DesignFactors, ProppantCatalog, ProppantReference, SampleRecord, ScreenCatalog, ScreenReference, SieveUnit,
};
use crate::error::{RecordKind, SandError};
use crate::io::session_file::LoadedSession;

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub sieve_unit: SieveUnit,
    pub samples: BTreeMap<String, SampleRecord>,
    pub screens: ScreenCatalog,
    pub proppants: ProppantCatalog,
    pub selected_screens: Vec<String>,
    pub selected_proppants: Vec<String>,
    pub design: DesignFactors,
    /// Failures from the most recent calculation.
    pub failures: Vec<SampleFailure>,
}

impl Session {
    pub fn new(screens: ScreenCatalog, proppants: ProppantCatalog, design: DesignFactors) -> Self {
        Self {
            screens,
            proppants,
            design,
            ..Self::default()
        }
    }

    /// Add samples to the collection, replacing any with the same name.
    ///
    /// Returns how many existing samples were replaced.
    pub fn append_samples(&mut self, samples: BTreeMap<String, SampleRecord>) -> usize {
        let mut replaced = 0;
        for (name, record) in samples {
            if self.samples.insert(name, record).is_some() {
                replaced += 1;
            }
        }
        replaced
    }

    /// Drop every sample and selection. Catalogs stay loaded.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.selected_screens.clear();
        self.selected_proppants.clear();
        self.failures.clear();
    }

    /// Replace unit, samples and selections with a saved session.
    ///
    /// Selections absent from the loaded catalogs are dropped with a warning.
    pub fn restore(&mut self, loaded: LoadedSession) {
        self.sieve_unit = loaded.unit;
        self.samples = loaded.samples;
        self.failures.clear();
        self.selected_screens = loaded.selected_screens;
        self.selected_proppants = loaded.selected_proppants;
        let screens = std::mem::take(&mut self.screens);
        self.set_screen_catalog(screens);
        let proppants = std::mem::take(&mut self.proppants);
        self.set_proppant_catalog(proppants);
    }

    /// Change the unit the raw sieve sizes are expressed in.
    ///
    /// Derived fields no longer match the raw sizes, so they are cleared.
    pub fn set_unit(&mut self, unit: SieveUnit) {
        if unit == self.sieve_unit {
            return;
        }
        self.sieve_unit = unit;
        for record in self.samples.values_mut() {
            record.clear_derived();
        }
    }

    pub fn set_screen_catalog(&mut self, screens: ScreenCatalog) {
        self.screens = screens;
        self.selected_screens.retain(|name| {
            let keep = self.screens.contains_key(name);
            if !keep {
                warn!(screen = %name, "selected screen missing from new catalog; deselected");
            }
            keep
        });
    }

    pub fn set_proppant_catalog(&mut self, proppants: ProppantCatalog) {
        self.proppants = proppants;
        self.selected_proppants.retain(|name| {
            let keep = self.proppants.contains_key(name);
            if !keep {
                warn!(proppant = %name, "selected proppant missing from new catalog; deselected");
            }
            keep
        });
    }

    /// Add a screen to the selection. Selecting twice is a no-op.
    pub fn select_screen(&mut self, name: &str) -> Result<(), SandError> {
        if !self.screens.contains_key(name) {
            return Err(SandError::not_found(RecordKind::Screen, name));
        }
        if !self.selected_screens.iter().any(|s| s == name) {
            self.selected_screens.push(name.to_string());
        }
        Ok(())
    }

    /// Add a proppant to the selection. The first selected proppant drives
    /// the scalar Constien criterion.
    pub fn select_proppant(&mut self, name: &str) -> Result<(), SandError> {
        if !self.proppants.contains_key(name) {
            return Err(SandError::not_found(RecordKind::Proppant, name));
        }
        if !self.selected_proppants.iter().any(|s| s == name) {
            self.selected_proppants.push(name.to_string());
        }
        Ok(())
    }

    pub fn selected_screen_refs(&self) -> Result<Vec<&ScreenReference>, SandError> {
        self.selected_screens
            .iter()
            .map(|name| {
                self.screens
                    .get(name)
                    .ok_or_else(|| SandError::not_found(RecordKind::Screen, name))
            })
            .collect()
    }

    pub fn selected_proppant_refs(&self) -> Result<Vec<&ProppantReference>, SandError> {
        self.selected_proppants
            .iter()
            .map(|name| {
                self.proppants
                    .get(name)
                    .ok_or_else(|| SandError::not_found(RecordKind::Proppant, name))
            })
            .collect()
    }

    pub fn sample(&self, name: &str) -> Result<&SampleRecord, SandError> {
        self.samples
            .get(name)
            .ok_or_else(|| SandError::not_found(RecordKind::Sample, name))
    }

    /// Samples ordered by depth (then name), as plotted and reported.
    pub fn samples_by_depth(&self) -> Vec<&SampleRecord> {
        let mut out: Vec<&SampleRecord> = self.samples.values().collect();
        out.sort_by(|a, b| a.depth.total_cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));
        out
    }

    pub fn calculated_count(&self) -> usize {
        self.samples.values().filter(|s| s.is_calculated()).count()
    }

    /// Run the batch calculation over every sample.
    ///
    /// Per-sample failures are kept in `self.failures`; an empty collection
    /// or an unknown proppant selection is an error for the whole call.
    pub fn calculate(&mut self) -> Result<&[SampleFailure], SandError> {
        if self.samples.is_empty() {
            return Err(SandError::not_found(RecordKind::Sample, "(no samples loaded)"));
        }
        let out = process_all(
            self.sieve_unit,
            &self.samples,
            &self.proppants,
            &self.selected_proppants,
            &self.design,
        )?;
        self.samples = out.samples;
        self.failures = out.failures;
        info!(
            calculated = self.calculated_count(),
            failed = self.failures.len(),
            "session recalculated"
        );
        Ok(&self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut screens = ScreenCatalog::new();
        screens.insert(
            "WWS 150".to_string(),
            ScreenReference {
                name: "WWS 150".to_string(),
                kind: "WWS".to_string(),
                aperture_micron: 150.0,
            },
        );
        let mut proppants = ProppantCatalog::new();
        proppants.insert(
            "Gravel 20/40".to_string(),
            ProppantReference {
                name: "Gravel 20/40".to_string(),
                permeability_d: 120.0,
                density_sg: 2.65,
                abs_volume_gal_per_lb: 0.0453,
                bulk_density_lb_ft3: 100.0,
                d50_micron: 650.0,
            },
        );
        Session::new(screens, proppants, DesignFactors::default())
    }

    fn sample(name: &str, depth: f64) -> SampleRecord {
        SampleRecord::new(
            name,
            depth,
            vec![2000.0, 1000.0, 500.0, 250.0, 125.0, 63.0],
            vec![5.0, 15.0, 30.0, 30.0, 15.0, 5.0],
        )
    }

    #[test]
    fn append_replaces_by_name() {
        let mut s = session();
        let mut batch = BTreeMap::new();
        batch.insert("A".to_string(), sample("A", 100.0));
        assert_eq!(s.append_samples(batch.clone()), 0);
        batch.insert("B".to_string(), sample("B", 90.0));
        assert_eq!(s.append_samples(batch), 1);
        assert_eq!(s.samples.len(), 2);

        let names: Vec<&str> = s.samples_by_depth().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn selecting_unknown_records_fails() {
        let mut s = session();
        assert_eq!(
            s.select_screen("nope"),
            Err(SandError::not_found(RecordKind::Screen, "nope"))
        );
        assert_eq!(
            s.select_proppant("nope"),
            Err(SandError::not_found(RecordKind::Proppant, "nope"))
        );
        s.select_proppant("Gravel 20/40").unwrap();
        s.select_proppant("Gravel 20/40").unwrap();
        assert_eq!(s.selected_proppants.len(), 1);
    }

    #[test]
    fn calculate_then_change_unit_clears_results() {
        let mut s = session();
        let mut batch = BTreeMap::new();
        batch.insert("A".to_string(), sample("A", 100.0));
        s.append_samples(batch);
        s.select_proppant("Gravel 20/40").unwrap();

        assert!(s.calculate().unwrap().is_empty());
        assert_eq!(s.calculated_count(), 1);
        assert!(s.samples["A"].constien_criterion.is_some());

        s.set_unit(SieveUnit::Mm);
        assert_eq!(s.calculated_count(), 0);
    }

    #[test]
    fn restore_replaces_samples_and_drops_unknown_selections() {
        let mut s = session();
        let mut batch = BTreeMap::new();
        batch.insert("Old".to_string(), sample("Old", 1.0));
        s.append_samples(batch);

        let mut samples = BTreeMap::new();
        samples.insert("New".to_string(), sample("New", 2.0));
        s.restore(LoadedSession {
            unit: SieveUnit::Mm,
            samples,
            selected_screens: vec!["WWS 150".to_string(), "Gone".to_string()],
            selected_proppants: vec!["Gravel 20/40".to_string()],
            saved_at: None,
        });

        assert_eq!(s.sieve_unit, SieveUnit::Mm);
        assert!(s.sample("Old").is_err());
        assert!(s.sample("New").is_ok());
        assert_eq!(s.selected_screens, vec!["WWS 150".to_string()]);
        assert_eq!(s.selected_proppants, vec!["Gravel 20/40".to_string()]);
    }

    #[test]
    fn clear_keeps_catalogs() {
        let mut s = session();
        s.select_screen("WWS 150").unwrap();
        s.clear();
        assert!(s.selected_screens.is_empty());
        assert_eq!(s.screens.len(), 1);
    }
}
