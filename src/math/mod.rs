//! Numerical helpers shared by the sieve analysis.

pub mod interp;

pub use interp::*;
