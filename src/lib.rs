//! `sand-control` library crate.
//!
//! The binary (`sand`) is a thin wrapper around this library so that:
//!
//! - the grain size engine is testable without spawning processes
//! - modules are reusable (batch scripts, other front-ends)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod sieve;
pub mod tui;
