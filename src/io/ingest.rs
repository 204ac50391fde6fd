//! Sieve CSV ingest and validation.
//!
//! Expected layout (one row per sample):
//!
//! ```text
//! name,depth,2000,1000,500,250,125,63
//! S1,2450.0,5,15,30,30,15,5
//! ```
//!
//! Every header after `name` and `depth` is a sieve size in the session's
//! sieve unit; row values are retained weights.
//!
//! Bad rows are skipped and reported; the import fails only when the header
//! is unusable or no row survives.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::SampleRecord;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: parsed samples plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedSieveData {
    pub source: String,
    /// Sieve sizes from the header, in file order.
    pub sieve_sizes: Vec<f64>,
    pub samples: BTreeMap<String, SampleRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a sieve CSV file.
pub fn load_sieve_file(path: &Path) -> Result<IngestedSieveData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open sieve CSV '{}': {e}", path.display())))?;
    let data = parse_sieve_csv(file, &path.display().to_string())?;
    info!(
        source = %data.source,
        rows_read = data.rows_read,
        rows_used = data.rows_used,
        row_errors = data.row_errors.len(),
        "sieve data imported"
    );
    Ok(data)
}

/// Parse sieve CSV content from any reader. `source` is used in messages.
pub fn parse_sieve_csv<R: Read>(reader: R, source: &str) -> Result<IngestedSieveData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers in '{source}': {e}")))?
        .clone();

    let layout = resolve_layout(&headers, source)?;

    let mut samples = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &layout) {
            Ok(sample) => {
                if sample.retained.iter().any(|w| *w < 0.0) {
                    warn!(sample = %sample.name, line, "negative retained weight");
                }
                if samples.contains_key(&sample.name) {
                    row_errors.push(RowError {
                        line,
                        id: Some(sample.name.clone()),
                        message: "Duplicate sample name; this row replaces the earlier one.".to_string(),
                    });
                }
                samples.insert(sample.name.clone(), sample);
            }
            Err((id, message)) => row_errors.push(RowError { line, id, message }),
        }
    }

    let rows_used = samples.len();
    if rows_used == 0 {
        return Err(AppError::new(3, format!("No valid sample rows in '{source}'.")));
    }

    Ok(IngestedSieveData {
        source: source.to_string(),
        sieve_sizes: layout.sizes.iter().map(|(_, size)| *size).collect(),
        samples,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Column positions resolved from the header.
#[derive(Debug)]
struct Layout {
    name_idx: usize,
    depth_idx: usize,
    /// (column index, sieve size)
    sizes: Vec<(usize, f64)>,
}

fn resolve_layout(headers: &StringRecord, source: &str) -> Result<Layout, AppError> {
    let header_map = build_header_map(headers);

    // Named columns win; otherwise the first two columns are name and depth.
    let name_idx = header_map.get("name").copied().unwrap_or(0);
    let depth_idx = header_map.get("depth").copied().unwrap_or(1);
    if name_idx == depth_idx {
        return Err(AppError::new(
            2,
            format!("Sieve CSV '{source}' needs distinct `name` and `depth` columns."),
        ));
    }

    let mut sizes = Vec::new();
    for (idx, raw) in headers.iter().enumerate() {
        if idx == name_idx || idx == depth_idx {
            continue;
        }
        let label = normalize_header_name(raw);
        let size = label.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
            AppError::new(
                2,
                format!("Sieve CSV '{source}': column header '{raw}' is not a sieve size."),
            )
        })?;
        sizes.push((idx, size));
    }

    if sizes.is_empty() {
        return Err(AppError::new(
            2,
            format!("Sieve CSV '{source}' has no sieve size columns."),
        ));
    }

    Ok(Layout {
        name_idx,
        depth_idx,
        sizes,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, layout: &Layout) -> Result<SampleRecord, (Option<String>, String)> {
    let name = record
        .get(layout.name_idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or((None, "Missing sample name.".to_string()))?
        .to_string();

    let depth = record
        .get(layout.depth_idx)
        .and_then(parse_f64)
        .ok_or_else(|| (Some(name.clone()), "Missing/invalid `depth` value.".to_string()))?;

    let mut sieve_sizes = Vec::with_capacity(layout.sizes.len());
    let mut retained = Vec::with_capacity(layout.sizes.len());
    for (idx, size) in &layout.sizes {
        let weight = record.get(*idx).and_then(parse_f64).ok_or_else(|| {
            (
                Some(name.clone()),
                format!("Missing/invalid retained weight for sieve {size}."),
            )
        })?;
        sieve_sizes.push(*size);
        retained.push(weight);
    }

    Ok(SampleRecord::new(name, depth, sieve_sizes, retained))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_sizes_and_rows() {
        let csv = "\u{feff}Name,Depth,2000,1000,500\nS1,2450,5,15,30\nS2,2460.5,1,2,3\n";
        let data = parse_sieve_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(data.sieve_sizes, vec![2000.0, 1000.0, 500.0]);
        assert_eq!(data.rows_used, 2);
        assert!(data.row_errors.is_empty());

        let s2 = &data.samples["S2"];
        assert_eq!(s2.depth, 2460.5);
        assert_eq!(s2.retained, vec![1.0, 2.0, 3.0]);
        assert!(!s2.is_calculated());
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let csv = "name,depth,0.5,0.25\nS1,100,1,2\nS2,abc,1,2\nS3,120,1\n,130,1,1\n";
        let data = parse_sieve_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 1);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 3);
        assert_eq!(data.row_errors[0].id.as_deref(), Some("S2"));
    }

    #[test]
    fn non_numeric_size_header_is_rejected() {
        let csv = "name,depth,coarse,fine\nS1,100,1,2\n";
        let err = parse_sieve_csv(csv.as_bytes(), "inline").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_usable_rows_is_no_data() {
        let csv = "name,depth,500,250\nS1,x,1,2\n";
        let err = parse_sieve_csv(csv.as_bytes(), "inline").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn duplicate_names_keep_the_last_row() {
        let csv = "name,depth,500,250\nS1,100,1,2\nS1,200,3,4\n";
        let data = parse_sieve_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(data.samples.len(), 1);
        assert_eq!(data.samples["S1"].depth, 200.0);
        assert_eq!(data.row_errors.len(), 1);
    }
}
