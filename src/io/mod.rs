//! Input/output helpers.
//!
//! - sieve CSV ingest + validation (`ingest`)
//! - screen/proppant catalogs (`catalog`)
//! - session save/load (`session_file`)
//! - results CSV export (`export`)

pub mod catalog;
pub mod export;
pub mod ingest;
pub mod session_file;

pub use catalog::*;
pub use export::*;
pub use ingest::*;
pub use session_file::*;
