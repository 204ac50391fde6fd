use std::fs;
use std::path::Path;

use sand_control::app::pipeline::run_analysis;
use sand_control::domain::{AnalysisConfig, DesignFactors, SieveUnit};
use sand_control::io::{export::write_results_csv, session_file};
use sand_control::plot::{render_figure_svg, FigureData};

const SIEVE_CSV: &str = "\
name,depth,2000,1000,500,250,125,63
S1,2450,5,15,30,30,15,5
S2,2455.5,0,10,20,40,20,10
Dry,2460,0,0,0,0,0,0
Broken,2465,1,x,1,1,1,1
";

const SCREENS: &str = r#"{
    "WWS 150": {"name": "WWS 150", "type": "WWS", "aperture_micron": 150},
    "PMM 250": {"name": "PMM 250", "type": "Premium", "aperture_micron": 250}
}"#;

const PROPPANTS: &str = r#"{
    "Gravel 20/40": {"name": "Gravel 20/40", "permeability_D": 120, "density_SG": 2.65,
        "absvol_gal/lb": 0.0453, "bulk_density_lb/ft3": 100, "D50_micron": 650},
    "Gravel 40/60": {"name": "Gravel 40/60", "permeability_D": 45, "density_SG": 2.65,
        "absvol_gal/lb": 0.0453, "bulk_density_lb/ft3": 100, "D50_micron": 325}
}"#;

fn config(dir: &Path) -> AnalysisConfig {
    let sieve = dir.join("sieve.csv");
    let screens = dir.join("screens.json");
    let proppants = dir.join("proppants.json");
    fs::write(&sieve, SIEVE_CSV).unwrap();
    fs::write(&screens, SCREENS).unwrap();
    fs::write(&proppants, PROPPANTS).unwrap();

    AnalysisConfig {
        sieve_paths: vec![sieve],
        unit: SieveUnit::Micron,
        screen_db: screens,
        proppant_db: proppants,
        screens: vec!["WWS 150".to_string()],
        proppants: vec!["Gravel 40/60".to_string(), "Gravel 20/40".to_string()],
        design: DesignFactors::default(),
        plot: false,
        plot_width: 80,
        plot_height: 20,
        save: None,
        export_results: None,
        export_figure: None,
    }
}

#[test]
fn analyze_save_reload_export_and_plot() {
    let dir = tempfile::tempdir().unwrap();
    let session = run_analysis(&config(dir.path())).unwrap();

    // Broken row is skipped at import; Dry fails on its own.
    assert_eq!(session.samples.len(), 3);
    assert_eq!(session.calculated_count(), 2);
    assert_eq!(session.failures.len(), 1);
    assert_eq!(session.failures[0].sample, "Dry");

    let s1 = session.sample("S1").unwrap();
    let stats = s1.statistics.unwrap();
    assert!((stats.d50 - 500.0).abs() < 1e-9);
    assert!((stats.uniformity_coeff - 4.0).abs() < 1e-9);
    assert_eq!(s1.constien_by_proppant.len(), 2);
    // The scalar criterion follows the first selected proppant.
    assert_eq!(s1.constien_criterion, s1.constien_by_proppant.get("Gravel 40/60").copied());

    let saved = dir.path().join("session.json");
    session_file::save_session(&saved, &session).unwrap();
    let loaded = session_file::load_session(&saved, &DesignFactors::default()).unwrap();
    assert_eq!(loaded.unit, SieveUnit::Micron);
    assert_eq!(loaded.selected_proppants, session.selected_proppants);
    assert_eq!(loaded.samples["S1"], *s1);
    assert!(!loaded.samples["Dry"].is_calculated());
    assert!(loaded.saved_at.is_some());

    let export = dir.path().join("results.csv");
    write_results_csv(&export, &session.samples_by_depth(), session.sieve_unit).unwrap();
    let text = fs::read_to_string(&export).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("S1,2450,micron,"));
    assert!(lines[3].starts_with("Dry,2460,micron,,"));

    let figure = FigureData::from_session(&session).unwrap();
    assert_eq!(figure.samples.len(), 2);
    assert_eq!(figure.screens, vec![("WWS 150".to_string(), 150.0)]);
    let svg = render_figure_svg(&figure).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Grain Size Distribution"));
}

#[test]
fn unknown_selection_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.proppants = vec!["Ceramic 16/20".to_string()];
    let err = run_analysis(&cfg).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("Ceramic 16/20"));
}

#[test]
fn mm_sizes_are_converted_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    let mm = dir.path().join("mm.csv");
    fs::write(&mm, "name,depth,2,1,0.5,0.25,0.125,0.063\nS1,2450,5,15,30,30,15,5\n").unwrap();
    cfg.sieve_paths = vec![mm];
    cfg.unit = SieveUnit::Mm;

    let mut session = run_analysis(&cfg).unwrap();
    let d50 = session.sample("S1").unwrap().statistics.unwrap().d50;
    assert!((d50 - 500.0).abs() < 1e-6);

    // Recalculating works from the raw sizes, not the converted ones.
    session.calculate().unwrap();
    let again = session.sample("S1").unwrap();
    assert!((again.statistics.unwrap().d50 - 500.0).abs() < 1e-6);
    assert_eq!(again.sieve_sizes, vec![2.0, 1.0, 0.5, 0.25, 0.125, 0.063]);
}
