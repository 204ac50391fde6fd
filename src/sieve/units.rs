//! Sieve aperture unit conversion.
//!
//! All analysis runs in micron. Conversions:
//!
//! - micron: identity
//! - mm: × 1000
//! - in: × 25.4
//! - phi: `1000 · 2^(-phi)` (phi = -log2(size in mm))
//! - mesh: US standard sieve series lookup (ASTM E11)

use crate::domain::SieveUnit;
use crate::error::SandError;

const MICRON_PER_MM: f64 = 1000.0;
const INCH_FACTOR: f64 = 25.4;

/// US standard sieve series: (mesh number, aperture in micron).
pub const US_STANDARD_SIEVES: [(f64, f64); 33] = [
    (3.5, 5600.0),
    (4.0, 4750.0),
    (5.0, 4000.0),
    (6.0, 3350.0),
    (7.0, 2800.0),
    (8.0, 2360.0),
    (10.0, 2000.0),
    (12.0, 1700.0),
    (14.0, 1400.0),
    (16.0, 1180.0),
    (18.0, 1000.0),
    (20.0, 850.0),
    (25.0, 710.0),
    (30.0, 600.0),
    (35.0, 500.0),
    (40.0, 425.0),
    (45.0, 355.0),
    (50.0, 300.0),
    (60.0, 250.0),
    (70.0, 212.0),
    (80.0, 180.0),
    (100.0, 150.0),
    (120.0, 125.0),
    (140.0, 106.0),
    (170.0, 90.0),
    (200.0, 75.0),
    (230.0, 63.0),
    (270.0, 53.0),
    (325.0, 45.0),
    (400.0, 38.0),
    (450.0, 32.0),
    (500.0, 25.0),
    (635.0, 20.0),
];

const TABLE_TOLERANCE: f64 = 1e-6;

/// Convert one size in `unit` to micron.
pub fn to_micron(value: f64, unit: SieveUnit) -> Result<f64, SandError> {
    match unit {
        SieveUnit::Micron => Ok(value),
        SieveUnit::Mm => Ok(value * MICRON_PER_MM),
        SieveUnit::In => Ok(value * INCH_FACTOR),
        SieveUnit::Phi => Ok(MICRON_PER_MM * 2f64.powf(-value)),
        SieveUnit::Mesh => US_STANDARD_SIEVES
            .iter()
            .find(|(mesh, _)| (mesh - value).abs() < TABLE_TOLERANCE)
            .map(|&(_, micron)| micron)
            .ok_or(SandError::UnknownMeshSize(value)),
    }
}

/// Convert one micron size back into `unit`.
///
/// For mesh the micron value must be an exact table aperture.
pub fn from_micron(micron: f64, unit: SieveUnit) -> Result<f64, SandError> {
    match unit {
        SieveUnit::Micron => Ok(micron),
        SieveUnit::Mm => Ok(micron / MICRON_PER_MM),
        SieveUnit::In => Ok(micron / INCH_FACTOR),
        SieveUnit::Phi => Ok(-(micron / MICRON_PER_MM).log2()),
        SieveUnit::Mesh => US_STANDARD_SIEVES
            .iter()
            .find(|(_, aperture)| (aperture - micron).abs() < TABLE_TOLERANCE)
            .map(|&(mesh, _)| mesh)
            .ok_or(SandError::UnknownMeshSize(micron)),
    }
}

/// Convert a sequence of sizes in `unit` to micron.
pub fn convert(sizes: &[f64], unit: SieveUnit) -> Result<Vec<f64>, SandError> {
    sizes.iter().map(|&v| to_micron(v, unit)).collect()
}
