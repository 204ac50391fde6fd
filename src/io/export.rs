//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Samples that were not calculated keep their name and depth with empty result columns.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{MobileFinesClass, SampleRecord, SieveUnit, UniformityClass, WentworthGrade};
use crate::error::AppError;

const HEADER: &str = "name,depth,sieve_unit,d5,d10,d40,d50,d90,d95,uniformity_coeff,sorting_factor,\
effective_size,mobile_fines_coeff,mobile_fines_size,average_formation_pore,smallest_particle_to_bridge,\
largest_particle_thru_pore,recommended_gravel_d50,recommended_frac_d50,constien_criterion,\
wentworth_grade,uniformity_class,mobile_fines_class";

/// Write per-sample results to a CSV file (rows in depth order).
pub fn write_results_csv(path: &Path, samples: &[&SampleRecord], unit: SieveUnit) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(&mut file, samples, unit)
}

pub fn write_results<W: Write>(out: &mut W, samples: &[&SampleRecord], unit: SieveUnit) -> Result<(), AppError> {
    writeln!(out, "{HEADER}").map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in samples {
        writeln!(out, "{}", format_row(r, unit))
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

fn format_row(r: &SampleRecord, unit: SieveUnit) -> String {
    let mut fields = vec![csv_text(&r.name), format!("{}", r.depth), unit.token().to_string()];

    match r.statistics {
        Some(s) => {
            let values = [
                s.d5,
                s.d10,
                s.d40,
                s.d50,
                s.d90,
                s.d95,
                s.uniformity_coeff,
                s.sorting_factor,
                s.effective_size,
                s.mobile_fines_coeff,
                s.mobile_fines_size,
                s.average_formation_pore,
                s.smallest_particle_to_bridge,
                s.largest_particle_thru_pore,
                s.recommended_gravel_d50,
                s.recommended_frac_d50,
            ];
            fields.extend(values.iter().map(|v| format!("{v:.6}")));
            fields.push(r.constien_criterion.map(|v| format!("{v:.6}")).unwrap_or_default());
            fields.push(WentworthGrade::classify(s.d50).label().to_string());
            fields.push(UniformityClass::classify(s.uniformity_coeff).label().to_string());
            fields.push(MobileFinesClass::classify(s.mobile_fines_coeff).label().to_string());
        }
        None => fields.extend(std::iter::repeat_n(String::new(), 20)),
    }

    fields.join(",")
}

/// Quote a text field when it contains a delimiter or quote.
fn csv_text(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DesignFactors;
    use crate::sieve::calculate_sieve_parameters;

    #[test]
    fn calculated_and_pending_rows_have_equal_width() {
        let mut done = SampleRecord::new(
            "S1",
            2450.0,
            vec![2000.0, 1000.0, 500.0, 250.0, 125.0, 63.0],
            vec![5.0, 15.0, 30.0, 30.0, 15.0, 5.0],
        );
        calculate_sieve_parameters(&mut done, SieveUnit::Micron, &DesignFactors::default()).unwrap();
        let pending = SampleRecord::new("S2, upper", 2460.0, vec![500.0], vec![1.0]);

        let mut buf = Vec::new();
        write_results(&mut buf, &[&done, &pending], SieveUnit::Micron).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut rows = csv::Reader::from_reader(text.as_bytes());
        let header_len = rows.headers().unwrap().len();
        let records: Vec<_> = rows.records().map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].len(), header_len);
        assert_eq!(records[1].len(), header_len);
        assert_eq!(&records[0][6], "500.000000");
        assert_eq!(&records[0][20], "MG Sand");
        assert_eq!(&records[1][0], "S2, upper");
        assert_eq!(&records[1][6], "");
    }
}
