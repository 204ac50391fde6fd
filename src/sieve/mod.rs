//! Grain-size statistics engine.
//!
//! - unit conversion to micron (`units`)
//! - cumulative weight-percent curve (`distribution`)
//! - percentile interpolation (`percentiles`)
//! - derived ratios (`ratios`)
//! - Constien screening and screen/proppant comparisons (`constien`)
//! - the per-sample chain tying them together (`analysis`)

pub mod analysis;
pub mod constien;
pub mod distribution;
pub mod percentiles;
pub mod ratios;
pub mod units;

pub use analysis::calculate_sieve_parameters;
pub use constien::{ProppantComparison, ScreenComparison, compare_proppants, compare_screens, constien, constien_criterion};
pub use distribution::build_cumulative;
pub use percentiles::interpolate_percentiles;
pub use ratios::{KeySizes, derive};
pub use units::{convert, from_micron, to_micron};
