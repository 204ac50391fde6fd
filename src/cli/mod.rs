//! Command-line parsing for the sand-control sieve analysis tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the calculation code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::domain::{AnalysisConfig, DesignFactors, SieveUnit};

pub mod menu;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sand", version, about = "Sand-control sieve analysis (grain size statistics and screening)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import sieve CSV(s), calculate every sample, print reports and optionally save/export/plot.
    Analyze(AnalyzeArgs),
    /// Print the reports of a saved session file.
    Report(SessionArgs),
    /// Plot a saved session (terminal plot, optional SVG figure).
    Plot(PlotArgs),
    /// Interactive numbered menu (the default when no command is given).
    Menu,
    /// Browse a saved session in the terminal UI.
    View(SessionArgs),
}

/// Options for the `analyze` command.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Sieve CSV file(s): `name,depth,<size>,<size>,...`. Later files overwrite samples by name.
    #[arg(short = 'f', long = "sieve", value_name = "CSV", required = true, num_args = 1..)]
    pub sieve: Vec<PathBuf>,

    /// Unit of the sieve sizes in the CSV header (defaults to SAND_SIEVE_UNIT or micron).
    #[arg(short = 'u', long, value_enum)]
    pub unit: Option<SieveUnit>,

    /// Screen catalog JSON (defaults to SAND_SCREEN_DB).
    #[arg(long, value_name = "JSON")]
    pub screen_db: Option<PathBuf>,

    /// Proppant catalog JSON (defaults to SAND_PROPPANT_DB).
    #[arg(long, value_name = "JSON")]
    pub proppant_db: Option<PathBuf>,

    /// Screen to compare against (repeatable).
    #[arg(long = "screen", value_name = "NAME")]
    pub screens: Vec<String>,

    /// Proppant to compare against (repeatable). The first drives the Constien criterion.
    #[arg(long = "proppant", value_name = "NAME")]
    pub proppants: Vec<String>,

    /// Average formation pore = D50 / this.
    #[arg(long, default_value_t = DesignFactors::default().pore_divisor)]
    pub pore_divisor: f64,

    /// Smallest particle to bridge = pore / this.
    #[arg(long, default_value_t = DesignFactors::default().bridge_divisor)]
    pub bridge_divisor: f64,

    /// Largest particle to pass through = pore / this.
    #[arg(long, default_value_t = DesignFactors::default().pass_through_divisor)]
    pub pass_through_divisor: f64,

    /// Mobile fines size = D50 / this.
    #[arg(long, default_value_t = DesignFactors::default().mobile_fines_divisor)]
    pub mobile_fines_divisor: f64,

    /// Recommended gravel D50 = this x formation D50.
    #[arg(long, default_value_t = DesignFactors::default().gravel_multiplier)]
    pub gravel_multiplier: f64,

    /// Recommended frac proppant D50 = this x formation D50.
    #[arg(long, default_value_t = DesignFactors::default().frac_multiplier)]
    pub frac_multiplier: f64,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Save the session to JSON.
    #[arg(long, value_name = "JSON")]
    pub save: Option<PathBuf>,

    /// Export per-sample results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Write the comparison figure to SVG.
    #[arg(long, value_name = "SVG")]
    pub figure: Option<PathBuf>,
}

/// Options for commands that read a saved session.
#[derive(Debug, Parser, Clone)]
pub struct SessionArgs {
    /// Session JSON written by `sand analyze --save` or the menu.
    #[arg(short = 's', long, value_name = "JSON")]
    pub session: PathBuf,
}

/// Options for plotting a saved session.
#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Session JSON written by `sand analyze --save` or the menu.
    #[arg(short = 's', long, value_name = "JSON")]
    pub session: PathBuf,

    /// Also write the comparison figure to SVG.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

impl AnalyzeArgs {
    pub fn design_factors(&self) -> DesignFactors {
        DesignFactors {
            pore_divisor: self.pore_divisor,
            bridge_divisor: self.bridge_divisor,
            pass_through_divisor: self.pass_through_divisor,
            mobile_fines_divisor: self.mobile_fines_divisor,
            gravel_multiplier: self.gravel_multiplier,
            frac_multiplier: self.frac_multiplier,
        }
    }
}

/// Merge CLI flags over environment settings.
pub fn analysis_config_from_args(args: &AnalyzeArgs, settings: &Settings) -> AnalysisConfig {
    AnalysisConfig {
        sieve_paths: args.sieve.clone(),
        unit: args.unit.unwrap_or(settings.sieve_unit),
        screen_db: args.screen_db.clone().unwrap_or_else(|| settings.screen_db.clone()),
        proppant_db: args.proppant_db.clone().unwrap_or_else(|| settings.proppant_db.clone()),
        screens: args.screens.clone(),
        proppants: args.proppants.clone(),
        design: args.design_factors(),
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        save: args.save.clone(),
        export_results: args.export.clone(),
        export_figure: args.figure.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_flags_override_settings() {
        let cli = Cli::parse_from([
            "sand", "analyze", "-f", "a.csv", "b.csv", "--unit", "mm", "--proppant", "Gravel 20/40",
            "--frac-multiplier", "10", "--no-plot",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let settings = Settings {
            screen_db: PathBuf::from("screens.json"),
            ..Settings::default()
        };
        let config = analysis_config_from_args(&args, &settings);

        assert_eq!(config.sieve_paths.len(), 2);
        assert_eq!(config.unit, SieveUnit::Mm);
        assert_eq!(config.screen_db, PathBuf::from("screens.json"));
        assert_eq!(config.proppants, vec!["Gravel 20/40".to_string()]);
        assert_eq!(config.design.frac_multiplier, 10.0);
        assert_eq!(config.design.pore_divisor, 6.5);
        assert!(!config.plot);
    }

    #[test]
    fn unit_falls_back_to_settings() {
        let cli = Cli::parse_from(["sand", "analyze", "--sieve", "a.csv"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let settings = Settings {
            sieve_unit: SieveUnit::Phi,
            ..Settings::default()
        };
        assert_eq!(analysis_config_from_args(&args, &settings).unit, SieveUnit::Phi);
    }
}
