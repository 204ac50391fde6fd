//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the calculation code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::SampleFailure;
use crate::app::session::Session;
use crate::domain::{
    MobileFinesClass, ProppantCatalog, SampleRecord, ScreenCatalog, SieveUnit, UniformityClass, WentworthGrade,
};
use crate::io::ingest::IngestedSieveData;
use crate::report::SampleComparisons;

/// Session header: unit, sample counts, selections and design factors.
pub fn format_session_header(session: &Session) -> String {
    let mut out = String::new();

    out.push_str("=== sand - Sieve Analysis ===\n");
    out.push_str(&format!("Units: {}\n", session.sieve_unit));
    out.push_str(&format!(
        "Samples: {} loaded | {} calculated\n",
        session.samples.len(),
        session.calculated_count()
    ));
    out.push_str(&format!(
        "Catalogs: {} screens | {} proppants\n",
        session.screens.len(),
        session.proppants.len()
    ));
    out.push_str(&format!("Selected screens: {}\n", fmt_list(&session.selected_screens)));
    out.push_str(&format!("Selected proppants: {}\n", fmt_list(&session.selected_proppants)));

    let d = &session.design;
    out.push_str(&format!(
        "Design: pore=D50/{} | bridge=pore/{} | pass=pore/{} | gravel={}xD50 | frac={}xD50\n",
        d.pore_divisor, d.bridge_divisor, d.pass_through_divisor, d.gravel_multiplier, d.frac_multiplier
    ));

    out
}

/// Raw sieve data: retained weight per sieve, one row per sample.
///
/// Column headers come from the first sample; samples with a different sieve
/// stack are flagged.
pub fn format_sieve_data(samples: &[&SampleRecord], unit: SieveUnit) -> String {
    let mut out = String::new();
    let Some(first) = samples.first() else {
        out.push_str("No sieve data loaded.\n");
        return out;
    };

    let mut header = format!("{:<16} {:>10}", "name", "depth");
    for size in &first.sieve_sizes {
        header.push_str(&format!(" {:>9}", fmt_size(*size)));
    }
    out.push_str(&format!("Sieve sizes ({unit}); values are retained weight\n"));
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(header.trim_end().len()));
    out.push('\n');

    for r in samples {
        let mut line = format!("{:<16} {:>10.2}", truncate(&r.name, 16), r.depth);
        for w in &r.retained {
            line.push_str(&format!(" {w:>9.2}"));
        }
        if r.sieve_sizes != first.sieve_sizes {
            line.push_str("  (different sieve stack)");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Analysis summary table.
pub fn format_analysis(samples: &[&SampleRecord]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<16} {:>10} {:>9} {:>9} {:>7} {:>8} {:>9} {:<10}\n",
            "name", "depth", "D10", "D50", "UC", "sorting", "constien", "grade"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<16} {:-<10} {:-<9} {:-<9} {:-<7} {:-<8} {:-<9} {:-<10}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in samples {
        let line = match r.statistics {
            Some(s) => format!(
                "{:<16} {:>10.2} {:>9.1} {:>9.1} {:>7.2} {:>8.2} {:>9} {:<10}",
                truncate(&r.name, 16),
                r.depth,
                s.d10,
                s.d50,
                s.uniformity_coeff,
                s.sorting_factor,
                r.constien_criterion.map(|c| format!("{c:.2}")).unwrap_or_else(|| "-".to_string()),
                WentworthGrade::classify(s.d50).label(),
            ),
            None => format!("{:<16} {:>10.2} (not calculated)", truncate(&r.name, 16), r.depth),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Full detail for one sample: percentile table, statistics, classes and
/// comparisons against the selected screens and proppants.
pub fn format_sample_detail(record: &SampleRecord, comparisons: Option<&SampleComparisons>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Sample {} @ {:.2}\n", record.name, record.depth));

    let Some(s) = record.statistics else {
        out.push_str("  not calculated\n");
        return out;
    };

    if let Some(p) = record.percentiles {
        out.push_str("  Percentiles (micron):\n");
        for (pct, size) in p.iter() {
            out.push_str(&format!("    D{pct:<3} {size:>10.2}\n"));
        }
    }

    out.push_str("  Statistics:\n");
    let rows = [
        ("Uniformity coefficient (D40/D90)", s.uniformity_coeff),
        ("Sorting factor (D10/D95)", s.sorting_factor),
        ("Effective size", s.effective_size),
        ("Mobile fines coefficient (D50/D95)", s.mobile_fines_coeff),
        ("Mobile fines size", s.mobile_fines_size),
        ("Average formation pore", s.average_formation_pore),
        ("Smallest particle to bridge", s.smallest_particle_to_bridge),
        ("Largest particle to pass", s.largest_particle_thru_pore),
        ("Recommended gravel D50", s.recommended_gravel_d50),
        ("Recommended frac D50", s.recommended_frac_d50),
    ];
    for (label, value) in rows {
        out.push_str(&format!("    {label:<36} {value:>10.3}\n"));
    }

    out.push_str(&format!(
        "  Classes: {} | {} | {}\n",
        WentworthGrade::classify(s.d50).label(),
        UniformityClass::classify(s.uniformity_coeff).label(),
        MobileFinesClass::classify(s.mobile_fines_coeff).label(),
    ));

    match record.constien_criterion {
        Some(c) => out.push_str(&format!("  Constien criterion: {c:.3}\n")),
        None => out.push_str("  Constien criterion: - (no proppant selected)\n"),
    }

    if let Some(cmp) = comparisons {
        for sc in &cmp.screens {
            out.push_str(&format!(
                "  Screen {:<24} aperture {:>8.1} | aperture/D10 {:>6.3}\n",
                truncate(&sc.screen, 24),
                sc.aperture_micron,
                sc.aperture_to_d10
            ));
        }
        for pc in &cmp.proppants {
            out.push_str(&format!(
                "  Proppant {:<22} D50 {:>8.1} | D50/d50 {:>6.2} | gravel {} | frac {} | constien {:.3}\n",
                truncate(&pc.proppant, 22),
                pc.d50_micron,
                pc.d50_ratio,
                if pc.within_gravel_rule { "ok" } else { "too coarse" },
                if pc.within_frac_rule { "ok" } else { "too coarse" },
                pc.constien,
            ));
        }
    }

    out
}

pub fn format_failures(failures: &[SampleFailure]) -> String {
    let mut out = String::new();
    if failures.is_empty() {
        return out;
    }
    out.push_str(&format!("{} sample(s) could not be calculated:\n", failures.len()));
    for f in failures {
        out.push_str(&format!("  {}: {}\n", f.sample, f.error));
    }
    out
}

pub fn format_row_errors(data: &IngestedSieveData) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {} of {} rows imported, {} skipped:\n",
        data.source,
        data.rows_used,
        data.rows_read,
        data.row_errors.len()
    ));
    for e in &data.row_errors {
        match &e.id {
            Some(id) => out.push_str(&format!("  line {} ({id}): {}\n", e.line, e.message)),
            None => out.push_str(&format!("  line {}: {}\n", e.line, e.message)),
        }
    }
    out
}

/// Numbered screen list, as offered for selection.
pub fn format_screen_catalog(screens: &ScreenCatalog) -> String {
    let mut out = String::new();
    for (idx, s) in screens.values().enumerate() {
        out.push_str(&format!(
            "{:>3}) {:<28} {:<12} {:>8.1} micron\n",
            idx + 1,
            truncate(&s.name, 28),
            truncate(&s.kind, 12),
            s.aperture_micron
        ));
    }
    out
}

/// Numbered proppant list, as offered for selection.
pub fn format_proppant_catalog(proppants: &ProppantCatalog) -> String {
    let mut out = String::new();
    for (idx, p) in proppants.values().enumerate() {
        out.push_str(&format!(
            "{:>3}) {:<28} D50 {:>7.1} micron | k {:>6.0} D | SG {:.2}\n",
            idx + 1,
            truncate(&p.name, 28),
            p.d50_micron,
            p.permeability_d,
            p.density_sg
        ));
    }
    out
}

fn fmt_list(items: &[String]) -> String {
    if items.is_empty() { "-".to_string() } else { items.join(", ") }
}

fn fmt_size(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v}") }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DesignFactors;
    use crate::error::SandError;
    use crate::sieve::calculate_sieve_parameters;

    fn calculated() -> SampleRecord {
        let mut r = SampleRecord::new(
            "S1",
            2450.0,
            vec![2000.0, 1000.0, 500.0, 250.0, 125.0, 63.0],
            vec![5.0, 15.0, 30.0, 30.0, 15.0, 5.0],
        );
        calculate_sieve_parameters(&mut r, SieveUnit::Micron, &DesignFactors::default()).unwrap();
        r
    }

    #[test]
    fn analysis_table_lists_calculated_and_pending() {
        let done = calculated();
        let pending = SampleRecord::new("S2", 2460.0, vec![500.0], vec![1.0]);
        let text = format_analysis(&[&done, &pending]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("S1"));
        assert!(lines[2].contains("500.0"));
        assert!(lines[2].contains("4.00"));
        assert!(lines[2].contains("MG Sand"));
        assert!(lines[3].contains("(not calculated)"));
    }

    #[test]
    fn sieve_table_uses_first_sample_sizes() {
        let a = SampleRecord::new("A", 1.0, vec![0.5, 0.25], vec![1.0, 2.0]);
        let b = SampleRecord::new("B", 2.0, vec![0.6, 0.3], vec![3.0, 4.0]);
        let text = format_sieve_data(&[&a, &b], SieveUnit::Mm);
        assert!(text.contains("Sieve sizes (mm)"));
        assert!(text.lines().nth(1).unwrap().ends_with("0.25"));
        assert!(text.contains("(different sieve stack)"));
    }

    #[test]
    fn detail_reports_classes_and_missing_constien() {
        let text = format_sample_detail(&calculated(), None);
        assert!(text.contains("MG Sand | Uniform | Fines Immobile"));
        assert!(text.contains("no proppant selected"));
        assert!(text.contains("D50"));
    }

    #[test]
    fn failures_are_listed() {
        let failures = vec![SampleFailure {
            sample: "S9".to_string(),
            error: SandError::EmptySample {
                name: "S9".to_string(),
            },
        }];
        let text = format_failures(&failures);
        assert!(text.starts_with("1 sample(s)"));
        assert!(text.contains("S9: Sample 'S9' has zero total retained weight"));
        assert!(format_failures(&[]).is_empty());
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
