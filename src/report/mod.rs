//! Reporting utilities: per-sample comparisons and formatted terminal output.

use crate::app::session::Session;
use crate::domain::SampleRecord;
use crate::error::SandError;
use crate::sieve::{ProppantComparison, ScreenComparison, compare_proppants, compare_screens};

pub mod format;

pub use format::*;

/// Selected screens and proppants measured against one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleComparisons {
    pub screens: Vec<ScreenComparison>,
    pub proppants: Vec<ProppantComparison>,
}

/// Compare the session's selections against a calculated sample.
///
/// Returns `None` when the sample has no statistics yet.
pub fn compare_selected(session: &Session, record: &SampleRecord) -> Result<Option<SampleComparisons>, SandError> {
    let Some(stats) = record.statistics.as_ref() else {
        return Ok(None);
    };
    let screens = session.selected_screen_refs()?;
    let proppants = session.selected_proppant_refs()?;
    Ok(Some(SampleComparisons {
        screens: compare_screens(stats, &screens),
        proppants: compare_proppants(stats, &proppants, &session.design),
    }))
}
