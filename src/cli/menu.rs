//! Interactive numbered menu.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the menu provides the "run `sand` and work on a session" UX
//!
//! Every command works on one [`Session`]. A failing command prints its
//! error and the loop carries on.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::session::Session;
use crate::config::Settings;
use crate::domain::SieveUnit;
use crate::error::AppError;

/// Default directory recursion depth for finding data files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

const MENU: &str = "\
 1) Open / append sieve data (CSV)
 2) Open saved file
 3) Import screen database
 4) Import proppant database
 5) Clear samples and selections
 6) Select screen
 7) Select proppant
 8) Select units
10) Perform calculations
11) Print analysis
12) Plot results
13) View results
20) Save file
 0) Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Menu state: the session being worked on plus the terminal streams.
pub struct Menu<'a, R, W> {
    session: &'a mut Session,
    settings: &'a Settings,
    input: R,
    output: W,
    /// When false, command 13 is refused (no real terminal to take over).
    allow_viewer: bool,
}

/// Run the menu on stdin/stdout until the user quits or input ends.
pub fn run_menu(session: &mut Session, settings: &Settings) -> Result<(), AppError> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Menu::new(session, settings, stdin.lock(), stdout.lock()).run()
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(session: &'a mut Session, settings: &'a Settings, input: R, output: W) -> Self {
        Self {
            session,
            settings,
            input,
            output,
            allow_viewer: true,
        }
    }

    /// Disable the full-screen viewer (used when the streams are not a terminal).
    pub fn without_viewer(mut self) -> Self {
        self.allow_viewer = false;
        self
    }

    pub fn run(mut self) -> Result<(), AppError> {
        loop {
            self.say(&format!("\n{MENU}"))?;
            let Some(line) = self.prompt("Select a command: ")? else {
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }
            let Ok(choice) = line.parse::<u32>() else {
                self.say(&format!("Invalid choice: {line}"))?;
                continue;
            };
            debug!(choice, "menu command");

            match self.execute(choice) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(err) => self.say(&format!("Error: {err}"))?,
            }
        }
    }

    fn execute(&mut self, choice: u32) -> Result<Flow, AppError> {
        match choice {
            0 => return Ok(Flow::Quit),
            1 => self.open_sieve_data()?,
            2 => self.open_saved_file()?,
            3 => self.import_screens()?,
            4 => self.import_proppants()?,
            5 => {
                self.session.clear();
                self.say("Samples and selections cleared.")?;
            }
            6 => self.select_screen()?,
            7 => self.select_proppant()?,
            8 => self.select_unit()?,
            10 => self.calculate()?,
            11 => self.print_analysis()?,
            12 => self.plot()?,
            13 => self.view()?,
            20 => self.save()?,
            other => self.say(&format!("Invalid choice: {other}"))?,
        }
        Ok(Flow::Continue)
    }

    fn open_sieve_data(&mut self) -> Result<(), AppError> {
        let files = discover_files("csv");
        if !files.is_empty() {
            let listing = numbered(files.iter().map(|p| pretty_path(p)));
            self.say(&format!("Found {} CSV file(s):\n{listing}", files.len()))?;
        }
        let Some(input) = self.prompt("CSV file (number or path, empty to cancel): ")? else {
            return Ok(());
        };
        if input.is_empty() {
            return Ok(());
        }
        let path = pick_path(&input, &files);
        let path = validate_file_path(&path, "csv")?;

        let ingest = crate::io::ingest::load_sieve_file(&path)?;
        if !ingest.row_errors.is_empty() {
            self.say(crate::report::format_row_errors(&ingest).trim_end())?;
        }
        let loaded = ingest.samples.len();
        let replaced = self.session.append_samples(ingest.samples);
        self.say(&format!(
            "Loaded {loaded} sample(s) ({replaced} replaced); {} in session, sizes in {}.",
            self.session.samples.len(),
            self.session.sieve_unit
        ))
    }

    fn open_saved_file(&mut self) -> Result<(), AppError> {
        let Some(path) = self.prompt_path("Saved session JSON: ", None)? else {
            return Ok(());
        };
        let loaded = crate::io::session_file::load_session(&path, &self.session.design)?;
        self.session.restore(loaded);
        self.say(&format!(
            "Opened {}: {} sample(s), {} calculated, units {}.",
            path.display(),
            self.session.samples.len(),
            self.session.calculated_count(),
            self.session.sieve_unit
        ))
    }

    fn import_screens(&mut self) -> Result<(), AppError> {
        let default = self.settings.screen_db.clone();
        let Some(path) = self.prompt_path("Screen database JSON", Some(&default))? else {
            return Ok(());
        };
        let screens = crate::io::catalog::load_screen_catalog(&path)?;
        let n = screens.len();
        self.session.set_screen_catalog(screens);
        self.say(&format!("Imported {n} screen(s)."))
    }

    fn import_proppants(&mut self) -> Result<(), AppError> {
        let default = self.settings.proppant_db.clone();
        let Some(path) = self.prompt_path("Proppant database JSON", Some(&default))? else {
            return Ok(());
        };
        let proppants = crate::io::catalog::load_proppant_catalog(&path)?;
        let n = proppants.len();
        self.session.set_proppant_catalog(proppants);
        self.say(&format!("Imported {n} proppant(s)."))
    }

    fn select_screen(&mut self) -> Result<(), AppError> {
        if self.session.screens.is_empty() {
            return Err(AppError::new(2, "No screen database loaded (command 3)."));
        }
        self.say(crate::report::format_screen_catalog(&self.session.screens).trim_end())?;
        let names: Vec<String> = self.session.screens.keys().cloned().collect();
        let Some(name) = self.choose("Screen (number or name): ", &names)? else {
            return Ok(());
        };
        self.session.select_screen(&name)?;
        self.say(&format!("Selected screens: {}", self.session.selected_screens.join(", ")))
    }

    fn select_proppant(&mut self) -> Result<(), AppError> {
        if self.session.proppants.is_empty() {
            return Err(AppError::new(2, "No proppant database loaded (command 4)."));
        }
        self.say(crate::report::format_proppant_catalog(&self.session.proppants).trim_end())?;
        let names: Vec<String> = self.session.proppants.keys().cloned().collect();
        let Some(name) = self.choose("Proppant (number or name): ", &names)? else {
            return Ok(());
        };
        self.session.select_proppant(&name)?;
        self.say(&format!("Selected proppants: {}", self.session.selected_proppants.join(", ")))
    }

    fn select_unit(&mut self) -> Result<(), AppError> {
        let names: Vec<String> = SieveUnit::ALL.iter().map(|u| u.token().to_string()).collect();
        self.say(numbered(names.iter().cloned()).trim_end())?;
        let Some(token) = self.choose(&format!("Sieve units [{}]: ", self.session.sieve_unit), &names)? else {
            return Ok(());
        };
        let unit: SieveUnit = token.parse()?;
        let had_results = self.session.calculated_count() > 0;
        self.session.set_unit(unit);
        if had_results && self.session.calculated_count() == 0 {
            self.say("Units changed; results cleared, run the calculations again.")?;
        }
        self.say(&format!("Sieve units: {unit}"))
    }

    fn calculate(&mut self) -> Result<(), AppError> {
        let failures = self.session.calculate()?;
        let report = crate::report::format_failures(failures);
        if !report.is_empty() {
            self.say(report.trim_end())?;
        }
        self.say(&format!(
            "Calculated {} of {} sample(s).",
            self.session.calculated_count(),
            self.session.samples.len()
        ))
    }

    fn print_analysis(&mut self) -> Result<(), AppError> {
        let text = crate::app::format_full_report(self.session)?;
        self.say(text.trim_end())
    }

    fn plot(&mut self) -> Result<(), AppError> {
        let samples = self.session.samples_by_depth();
        let plot = crate::plot::render_cumulative_plot(&samples, 100, 25);
        self.say(plot.trim_end())?;

        let Some(input) = self.prompt("Write comparison figure to SVG (path, empty to skip): ")? else {
            return Ok(());
        };
        if input.is_empty() {
            return Ok(());
        }
        let data = crate::plot::FigureData::from_session(self.session)?;
        crate::plot::write_figure_svg(Path::new(&input), &data)?;
        self.say(&format!("Figure written to {input}."))
    }

    fn view(&mut self) -> Result<(), AppError> {
        if !self.allow_viewer {
            return Err(AppError::new(2, "The results viewer needs an interactive terminal."));
        }
        crate::tui::run_viewer(self.session)
    }

    fn save(&mut self) -> Result<(), AppError> {
        let Some(path) = self.prompt_path("Save session to JSON: ", None)? else {
            return Ok(());
        };
        crate::io::session_file::save_session(&path, self.session)?;
        self.say(&format!("Saved {} sample(s) to {}.", self.session.samples.len(), path.display()))
    }

    /// Pick one of `names` by 1-based number, or take the text as a name.
    fn choose(&mut self, msg: &str, names: &[String]) -> Result<Option<String>, AppError> {
        let Some(input) = self.prompt(msg)? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(None);
        }
        if let Ok(n) = input.parse::<usize>() {
            if (1..=names.len()).contains(&n) {
                return Ok(Some(names[n - 1].clone()));
            }
        }
        Ok(Some(input))
    }

    /// Ask for a path; an empty answer takes `default` (or cancels when there is none).
    fn prompt_path(&mut self, msg: &str, default: Option<&Path>) -> Result<Option<PathBuf>, AppError> {
        let msg = match default {
            Some(d) => format!("{msg} [{}]: ", d.display()),
            None => msg.to_string(),
        };
        let Some(input) = self.prompt(&msg)? else {
            return Ok(None);
        };
        if input.is_empty() {
            return Ok(default.map(Path::to_path_buf));
        }
        Ok(Some(PathBuf::from(input)))
    }

    /// Print `msg` without a newline and read one trimmed line. `None` on end of input.
    fn prompt(&mut self, msg: &str) -> Result<Option<String>, AppError> {
        write!(self.output, "{msg}").map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;
        self.output
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = self
            .input
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    fn say(&mut self, msg: &str) -> Result<(), AppError> {
        writeln!(self.output, "{msg}").map_err(|e| AppError::new(2, format!("Failed to write output: {e}")))
    }
}

fn numbered<I: IntoIterator<Item = String>>(items: I) -> String {
    let mut out = String::new();
    for (idx, item) in items.into_iter().enumerate() {
        out.push_str(&format!("{:>3}) {item}\n", idx + 1));
    }
    out
}

/// A number picks from `files`; anything else is a path.
fn pick_path(input: &str, files: &[PathBuf]) -> PathBuf {
    match input.parse::<usize>() {
        Ok(n) if (1..=files.len()).contains(&n) => files[n - 1].clone(),
        _ => PathBuf::from(input),
    }
}

/// Validate the provided path points to an existing file with extension `ext`.
pub fn validate_file_path(path: &Path, ext: &str) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("File not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_extension(path, ext) {
        return Err(AppError::new(
            2,
            format!("Expected a .{ext} file (got: {})", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// Discover files with extension `ext` under the current directory (deterministic order).
pub fn discover_files(ext: &str) -> Vec<PathBuf> {
    find_files(Path::new("."), ext, DEFAULT_SEARCH_DEPTH)
}

fn find_files(root: &Path, ext: &str, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_files_inner(root, ext, 0, max_depth, &mut out);
    out.sort_by(|a, b| pretty_path(a).cmp(&pretty_path(b)));
    out
}

fn find_files_inner(root: &Path, ext: &str, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_files_inner(&path, ext, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file() && has_extension(&path, ext) {
            out.push(path);
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        == Some(true)
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Cursor;

    use super::*;
    use crate::domain::{DesignFactors, ProppantCatalog, ProppantReference, SampleRecord, ScreenCatalog};

    fn session() -> Session {
        let mut proppants = ProppantCatalog::new();
        proppants.insert(
            "Gravel 20/40".to_string(),
            ProppantReference {
                name: "Gravel 20/40".to_string(),
                permeability_d: 120.0,
                density_sg: 2.65,
                abs_volume_gal_per_lb: 0.0453,
                bulk_density_lb_ft3: 100.0,
                d50_micron: 650.0,
            },
        );
        let mut s = Session::new(ScreenCatalog::new(), proppants, DesignFactors::default());
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
        s.append_samples(samples);
        s
    }

    fn run_script(session: &mut Session, script: &str) -> String {
        let settings = Settings::default();
        let mut out = Vec::new();
        Menu::new(session, &settings, Cursor::new(script.as_bytes().to_vec()), &mut out)
            .without_viewer()
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn select_calculate_and_print() {
        let mut s = session();
        let out = run_script(&mut s, "7\n1\n10\n11\n0\n");

        assert_eq!(s.selected_proppants, vec!["Gravel 20/40".to_string()]);
        assert_eq!(s.calculated_count(), 1);
        assert!(out.contains("Calculated 1 of 1 sample(s)."));
        assert!(out.contains("Sample S1 @ 2450.00"));
    }

    #[test]
    fn errors_do_not_end_the_loop() {
        let mut s = session();
        let out = run_script(&mut s, "6\n7\nnope\n42\nabc\n5\n");

        assert!(out.contains("Error: No screen database loaded"));
        assert!(out.contains("Error: Proppant 'nope' not found"));
        assert!(out.contains("Invalid choice: 42"));
        assert!(out.contains("Invalid choice: abc"));
        assert!(s.samples.is_empty());
    }

    #[test]
    fn unit_change_clears_results() {
        let mut s = session();
        let out = run_script(&mut s, "10\n8\n2\n");
        assert_eq!(s.sieve_unit, SieveUnit::Mm);
        assert_eq!(s.calculated_count(), 0);
        assert!(out.contains("results cleared"));
    }

    #[test]
    fn pick_path_prefers_listed_numbers() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(pick_path("2", &files), PathBuf::from("b.csv"));
        assert_eq!(pick_path("3", &files), PathBuf::from("3"));
        assert_eq!(pick_path("data/c.csv", &files), PathBuf::from("data/c.csv"));
    }
}
