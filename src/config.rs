//! Environment-driven settings.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. CLI flags override them.

use std::path::PathBuf;

use crate::domain::SieveUnit;
use crate::error::AppError;

pub const DEFAULT_SCREEN_DB: &str = "database_screen.json";
pub const DEFAULT_PROPPANT_DB: &str = "database_proppant.json";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub screen_db: PathBuf,
    pub proppant_db: PathBuf,
    pub sieve_unit: SieveUnit,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_db: PathBuf::from(DEFAULT_SCREEN_DB),
            proppant_db: PathBuf::from(DEFAULT_PROPPANT_DB),
            sieve_unit: SieveUnit::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read the `SAND_*` variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let sieve_unit = match get("SAND_SIEVE_UNIT") {
            Some(raw) => raw
                .parse::<SieveUnit>()
                .map_err(|e| AppError::new(2, format!("Invalid SAND_SIEVE_UNIT: {e}")))?,
            None => defaults.sieve_unit,
        };

        Ok(Self {
            screen_db: get("SAND_SCREEN_DB").map(PathBuf::from).unwrap_or(defaults.screen_db),
            proppant_db: get("SAND_PROPPANT_DB").map(PathBuf::from).unwrap_or(defaults.proppant_db),
            sieve_unit,
            log_filter: resolve_log_filter(&lookup),
        })
    }
}

/// Log filter for the subscriber: `SAND_LOG`, then `RUST_LOG`, then `warn`.
///
/// Read on its own so logging can start before the rest of the settings parse.
pub fn log_filter_from_env() -> String {
    resolve_log_filter(|key| std::env::var(key).ok())
}

fn resolve_log_filter<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["SAND_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.screen_db, PathBuf::from("database_screen.json"));
    }

    #[test]
    fn variables_override_defaults() {
        let s = Settings::from_lookup(lookup(&[
            ("SAND_SCREEN_DB", "db/screens.json"),
            ("SAND_SIEVE_UNIT", "mm"),
            ("SAND_LOG", ""),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(s.screen_db, PathBuf::from("db/screens.json"));
        assert_eq!(s.proppant_db, PathBuf::from(DEFAULT_PROPPANT_DB));
        assert_eq!(s.sieve_unit, SieveUnit::Mm);
        assert_eq!(s.log_filter, "debug");
    }

    #[test]
    fn bad_unit_is_an_input_error() {
        let err = Settings::from_lookup(lookup(&[("SAND_SIEVE_UNIT", "furlong")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
