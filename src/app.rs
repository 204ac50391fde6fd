//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads catalogs and sieve data
//! - runs the per-sample calculations
//! - prints reports/plots
//! - writes optional saves and exports

use clap::Parser;
use tracing::warn;

use crate::cli::{AnalyzeArgs, Command, PlotArgs, SessionArgs};
use crate::config::Settings;
use crate::domain::{AnalysisConfig, ProppantCatalog, ScreenCatalog};
use crate::error::{AppError, SandError};

pub mod pipeline;
pub mod session;

use session::Session;

/// Entry point for the `sand` binary.
pub fn run() -> Result<(), AppError> {
    // We want a bare `sand` to behave like `sand menu`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args, &settings),
        Command::Report(args) => handle_report(&args, &settings),
        Command::Plot(args) => handle_plot(&args, &settings),
        Command::Menu => handle_menu(&settings),
        Command::View(args) => handle_view(&args, &settings),
    }
}

fn handle_analyze(args: &AnalyzeArgs, settings: &Settings) -> Result<(), AppError> {
    let config = crate::cli::analysis_config_from_args(args, settings);
    let session = pipeline::run_analysis(&config)?;

    println!("{}", format_full_report(&session)?);

    if config.plot {
        let plot = crate::plot::render_cumulative_plot(&session.samples_by_depth(), config.plot_width, config.plot_height);
        println!("{plot}");
    }

    write_outputs(&session, &config)
}

fn write_outputs(session: &Session, config: &AnalysisConfig) -> Result<(), AppError> {
    if let Some(path) = &config.save {
        crate::io::session_file::save_session(path, session)?;
    }
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &session.samples_by_depth(), session.sieve_unit)?;
    }
    if let Some(path) = &config.export_figure {
        let data = crate::plot::FigureData::from_session(session)?;
        crate::plot::write_figure_svg(path, &data)?;
    }
    Ok(())
}

fn handle_report(args: &SessionArgs, settings: &Settings) -> Result<(), AppError> {
    let session = open_saved_session(&args.session, settings)?;
    println!("{}", format_full_report(&session)?);
    Ok(())
}

fn handle_plot(args: &PlotArgs, settings: &Settings) -> Result<(), AppError> {
    let session = open_saved_session(&args.session, settings)?;
    let plot = crate::plot::render_cumulative_plot(&session.samples_by_depth(), args.width, args.height);
    println!("{plot}");

    if let Some(path) = &args.svg {
        let data = crate::plot::FigureData::from_session(&session)?;
        crate::plot::write_figure_svg(path, &data)?;
    }
    Ok(())
}

fn handle_menu(settings: &Settings) -> Result<(), AppError> {
    let (screens, proppants) = load_catalogs_lenient(settings);
    let mut session = Session::new(screens, proppants, Default::default());
    session.set_unit(settings.sieve_unit);
    crate::cli::menu::run_menu(&mut session, settings)
}

fn handle_view(args: &SessionArgs, settings: &Settings) -> Result<(), AppError> {
    let session = open_saved_session(&args.session, settings)?;
    crate::tui::run_viewer(&session)
}

/// A session rebuilt from a saved file, with whatever catalogs are available.
fn open_saved_session(path: &std::path::Path, settings: &Settings) -> Result<Session, AppError> {
    let (screens, proppants) = load_catalogs_lenient(settings);
    let mut session = Session::new(screens, proppants, Default::default());
    let loaded = crate::io::session_file::load_session(path, &session.design)?;
    session.restore(loaded);
    Ok(session)
}

/// Load both catalogs; a missing or unreadable catalog is logged and left empty.
fn load_catalogs_lenient(settings: &Settings) -> (ScreenCatalog, ProppantCatalog) {
    let screens = crate::io::catalog::load_screen_catalog(&settings.screen_db).unwrap_or_else(|err| {
        warn!(path = %settings.screen_db.display(), error = %err, "screen catalog not loaded");
        ScreenCatalog::new()
    });
    let proppants = crate::io::catalog::load_proppant_catalog(&settings.proppant_db).unwrap_or_else(|err| {
        warn!(path = %settings.proppant_db.display(), error = %err, "proppant catalog not loaded");
        ProppantCatalog::new()
    });
    (screens, proppants)
}

/// Everything `print analysis` shows: header, sieve data, analysis table,
/// per-sample detail with comparisons, and failures from the last run.
pub fn format_full_report(session: &Session) -> Result<String, SandError> {
    let samples = session.samples_by_depth();
    let mut out = String::new();

    out.push_str(&crate::report::format_session_header(session));
    out.push('\n');
    out.push_str(&crate::report::format_sieve_data(&samples, session.sieve_unit));
    out.push('\n');
    out.push_str(&crate::report::format_analysis(&samples));

    for record in samples.iter().filter(|r| r.is_calculated()) {
        let comparisons = crate::report::compare_selected(session, record)?;
        out.push('\n');
        out.push_str(&crate::report::format_sample_detail(record, comparisons.as_ref()));
    }

    let failures = crate::report::format_failures(&session.failures);
    if !failures.is_empty() {
        out.push('\n');
        out.push_str(&failures);
    }
    Ok(out)
}

/// Rewrite argv so `sand` defaults to `sand menu`.
///
/// Rules:
/// - `sand`                      -> `sand menu`
/// - `sand --help/--version/-h`  -> unchanged (show top-level help/version)
/// - `sand -f data.csv ...`      -> `sand analyze -f data.csv ...`
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("menu".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "report" | "plot" | "menu" | "view");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "analyze flags".
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{DesignFactors, SampleRecord};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_menu() {
        assert_eq!(rewrite_args(args(&["sand"])), args(&["sand", "menu"]));
        assert_eq!(
            rewrite_args(args(&["sand", "-f", "a.csv"])),
            args(&["sand", "analyze", "-f", "a.csv"])
        );
        assert_eq!(rewrite_args(args(&["sand", "--help"])), args(&["sand", "--help"]));
        assert_eq!(
            rewrite_args(args(&["sand", "view", "-s", "x.json"])),
            args(&["sand", "view", "-s", "x.json"])
        );
    }

    #[test]
    fn full_report_covers_calculated_samples() {
        let mut session = Session::new(ScreenCatalog::new(), ProppantCatalog::new(), DesignFactors::default());
        let mut samples = BTreeMap::new();
        samples.insert(
            "S1".to_string(),
            SampleRecord::new(
                "S1",
                2450.0,
                vec![2000.0, 1000.0, 500.0, 250.0, 125.0, 63.0],
                vec![5.0, 15.0, 30.0, 30.0, 15.0, 5.0],
            ),
        );
        samples.insert(
            "Dry".to_string(),
            SampleRecord::new("Dry", 2460.0, vec![500.0, 250.0], vec![0.0, 0.0]),
        );
        session.append_samples(samples);
        session.calculate().unwrap();

        let text = format_full_report(&session).unwrap();
        assert!(text.contains("=== sand - Sieve Analysis ==="));
        assert!(text.contains("Sample S1 @ 2450.00"));
        assert!(!text.contains("Sample Dry @"));
        assert!(text.contains("1 sample(s) could not be calculated"));
    }
}
