//! Ratatui-based results viewer.
//!
//! Shows the session's samples in depth order with a grain size chart
//! (cumulative or retained) and the derived statistics of the selected sample.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::session::Session;
use crate::domain::{MobileFinesClass, SampleRecord, UniformityClass, WentworthGrade, WENTWORTH_BOUNDARIES};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::SizeDistributionChart;

/// Browse the samples of `session` until the user quits.
pub fn run_viewer(session: &Session) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = Viewer::new(session);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartMode {
    Cumulative,
    Retained,
}

impl ChartMode {
    fn toggle(self) -> Self {
        match self {
            ChartMode::Cumulative => ChartMode::Retained,
            ChartMode::Retained => ChartMode::Cumulative,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ChartMode::Cumulative => "Cumulative weight %",
            ChartMode::Retained => "Retained weight",
        }
    }
}

struct Viewer<'a> {
    session: &'a Session,
    samples: Vec<&'a SampleRecord>,
    selected: usize,
    mode: ChartMode,
    status: String,
}

impl<'a> Viewer<'a> {
    fn new(session: &'a Session) -> Self {
        let samples = session.samples_by_depth();
        let status = if samples.is_empty() {
            "Session has no samples.".to_string()
        } else {
            format!("{} sample(s), {} calculated", samples.len(), session.calculated_count())
        };
        Self {
            session,
            samples,
            selected: 0,
            mode: ChartMode::Cumulative,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut dirty = true;
        loop {
            if dirty {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                dirty = false;
            }

            let ready = event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?;
            if !ready {
                continue;
            }

            let ev = event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))?;
            dirty = match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key.code) {
                        return Ok(());
                    }
                    true
                }
                Event::Resize(_, _) => true,
                _ => false,
            };
        }
    }

    /// Returns true when the viewer should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.samples.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('m') => {
                self.mode = self.mode.toggle();
                self.status = format!("chart: {}", self.mode.title());
            }
            _ => {}
        }
        false
    }

    fn current(&self) -> Option<&'a SampleRecord> {
        self.samples.get(self.selected).copied()
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("sand", Style::default().fg(Color::Cyan)),
                Span::raw(" | sieve analysis results"),
            ]),
            Line::from(Span::styled(
                format!(
                    "units: {} | screens: {} | proppants: {}",
                    self.session.sieve_unit,
                    join_or_dash(&self.session.selected_screens),
                    join_or_dash(&self.session.selected_proppants),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(14)])
            .split(columns[1]);

        self.draw_sample_list(frame, columns[0]);
        self.draw_chart(frame, right[0]);
        self.draw_stats(frame, right[1]);
    }

    fn draw_sample_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .samples
            .iter()
            .map(|r| {
                let style = if r.is_calculated() {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(format!("{:<14} {:>10.2}", r.name, r.depth)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Samples").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.samples.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.mode.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(series) = self.current().and_then(|r| chart_series(r, self.mode)) else {
            let msg = Paragraph::new("No plottable data for this sample.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = SizeDistributionChart {
            points: &series.points,
            boundaries: &series.boundaries,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "size (micron)",
            y_label: self.mode.title(),
            fmt_x: fmt_axis_size,
            fmt_y: fmt_axis_value,
        };

        frame.render_widget(widget, inner);
    }

    fn draw_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = match self.current() {
            Some(r) => stats_lines(r),
            None => vec!["-".to_string()],
        };
        let text = Text::from(lines.into_iter().map(Line::from).collect::<Vec<_>>());
        let p = Paragraph::new(text).block(Block::default().title("Statistics").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  m cumulative/retained  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart-ready series for one sample.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    points: Vec<(f64, f64)>,
    boundaries: Vec<f64>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build the (log10 size, value) series for `mode`.
///
/// Cumulative needs a calculated sample; retained falls back to the raw sizes.
fn chart_series(record: &SampleRecord, mode: ChartMode) -> Option<ChartSeries> {
    let values: &[f64] = match mode {
        ChartMode::Cumulative => &record.cumulative_wt_perc,
        ChartMode::Retained => &record.retained,
    };
    let sizes = record.plot_sizes();
    if values.len() != sizes.len() {
        return None;
    }

    let points: Vec<(f64, f64)> = sizes
        .iter()
        .zip(values.iter())
        .filter(|(s, v)| **s > 0.0 && s.is_finite() && v.is_finite())
        .map(|(&s, &v)| (s.log10(), v))
        .collect();
    if points.is_empty() {
        return None;
    }

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y_max = f64::NEG_INFINITY;
    for &(x, y) in &points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }
    if x_max <= x_min {
        x_min -= 0.5;
        x_max += 0.5;
    }

    let y_bounds = match mode {
        ChartMode::Cumulative => [0.0, 100.0],
        ChartMode::Retained => [0.0, if y_max > 0.0 { y_max * 1.05 } else { 1.0 }],
    };

    let boundaries = WENTWORTH_BOUNDARIES
        .iter()
        .map(|(_, b)| b.log10())
        .filter(|lb| *lb > x_min && *lb < x_max)
        .collect();

    Some(ChartSeries {
        points,
        boundaries,
        x_bounds: [x_min, x_max],
        y_bounds,
    })
}

/// Statistics panel text for one sample.
fn stats_lines(r: &SampleRecord) -> Vec<String> {
    let Some(s) = r.statistics else {
        return vec![format!("{} @ {:.2}: not calculated", r.name, r.depth)];
    };
    let constien = r
        .constien_criterion
        .map(|c| format!("{c:.3}"))
        .unwrap_or_else(|| "-".to_string());
    vec![
        format!("{} @ {:.2}", r.name, r.depth),
        format!("D5 {:.1} | D10 {:.1} | D40 {:.1}", s.d5, s.d10, s.d40),
        format!("D50 {:.1} | D90 {:.1} | D95 {:.1}", s.d50, s.d90, s.d95),
        format!(
            "UC {:.2} ({}) | sorting {:.2}",
            s.uniformity_coeff,
            UniformityClass::classify(s.uniformity_coeff).label(),
            s.sorting_factor
        ),
        format!(
            "fines coeff {:.2} ({}) | fines size {:.1}",
            s.mobile_fines_coeff,
            MobileFinesClass::classify(s.mobile_fines_coeff).label(),
            s.mobile_fines_size
        ),
        format!(
            "pore {:.1} | bridge {:.1} | pass {:.1}",
            s.average_formation_pore, s.smallest_particle_to_bridge, s.largest_particle_thru_pore
        ),
        format!(
            "gravel D50 {:.0} | frac D50 {:.0} | effective {:.1}",
            s.recommended_gravel_d50, s.recommended_frac_d50, s.effective_size
        ),
        format!("grade {} | Constien {constien}", WentworthGrade::classify(s.d50).label()),
    ]
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn fmt_axis_size(v: f64) -> String {
    format!("{:.0}", 10f64.powf(v))
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.0}")
}
