//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sieve units and design constants (`SieveUnit`, `DesignFactors`)
//! - the per-test aggregate (`SampleRecord`) and its derived outputs
//! - catalogued reference products (`ScreenReference`, `ProppantReference`)
//! - grain-size, uniformity and mobile-fines classifications

pub mod classification;
pub mod types;

pub use classification::*;
pub use types::*;
