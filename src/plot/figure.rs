//! The 2x4 comparison figure, rendered to SVG with Plotters.
//!
//! Panels (row, column):
//!
//! | | 0 | 1 | 2 | 3 |
//! |---|---|---|---|---|
//! | 0 | retained vs size | UC vs depth | pore sizes vs depth | D10 vs depth + screens |
//! | 1 | cumulative vs size | UC vs D50 | proppant D50/d50 | gravel D50 vs depth + proppants |
//!
//! Depth axes increase downwards.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use tracing::info;

use crate::app::session::Session;
use crate::domain::{DesignFactors, SieveStatistics, UNIFORMITY_BOUNDARIES, WENTWORTH_BOUNDARIES};
use crate::error::{AppError, SandError};

type PanelResult = Result<(), Box<dyn Error>>;

const FIGURE_SIZE: (u32, u32) = (1800, 900);
const TITLE: &str = "Grain Size Distribution and Uniformity Coefficients";
const RATIO_LINES: [f64; 3] = [6.0, 8.0, 10.0];

/// One calculated sample, reduced to what the panels draw.
#[derive(Debug, Clone)]
pub struct FigureSample {
    pub name: String,
    pub depth: f64,
    /// (size micron, retained weight)
    pub retained: Vec<(f64, f64)>,
    /// (size micron, cumulative %)
    pub cumulative: Vec<(f64, f64)>,
    pub stats: SieveStatistics,
}

#[derive(Debug, Clone)]
pub struct FigureData {
    pub samples: Vec<FigureSample>,
    /// (name, aperture micron)
    pub screens: Vec<(String, f64)>,
    /// (name, D50 micron)
    pub proppants: Vec<(String, f64)>,
    pub design: DesignFactors,
}

impl FigureData {
    /// Collect calculated samples (depth order) and the selected products.
    pub fn from_session(session: &Session) -> Result<Self, SandError> {
        let samples = session
            .samples_by_depth()
            .into_iter()
            .filter_map(|r| {
                let stats = r.statistics?;
                let sizes = r.plot_sizes();
                Some(FigureSample {
                    name: r.name.clone(),
                    depth: r.depth,
                    retained: sizes.iter().copied().zip(r.retained.iter().copied()).collect(),
                    cumulative: sizes.iter().copied().zip(r.cumulative_wt_perc.iter().copied()).collect(),
                    stats,
                })
            })
            .collect();

        let screens = session
            .selected_screen_refs()?
            .into_iter()
            .map(|s| (s.name.clone(), s.aperture_micron))
            .collect();
        let proppants = session
            .selected_proppant_refs()?
            .into_iter()
            .map(|p| (p.name.clone(), p.d50_micron))
            .collect();

        Ok(Self {
            samples,
            screens,
            proppants,
            design: session.design,
        })
    }
}

/// Render the figure into an SVG document.
pub fn render_figure_svg(data: &FigureData) -> Result<String, AppError> {
    if data.samples.is_empty() {
        return Err(AppError::new(3, "No calculated samples to plot."));
    }
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, FIGURE_SIZE).into_drawing_area();
        draw_figure(&root, data).map_err(|e| AppError::new(4, format!("Failed to render figure: {e}")))?;
    }
    Ok(svg)
}

/// Render the figure and write it to `path`.
pub fn write_figure_svg(path: &Path, data: &FigureData) -> Result<(), AppError> {
    let svg = render_figure_svg(data)?;
    std::fs::write(path, svg)
        .map_err(|e| AppError::new(2, format!("Failed to write figure '{}': {e}", path.display())))?;
    info!(path = %path.display(), samples = data.samples.len(), "figure written");
    Ok(())
}

fn draw_figure(root: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    root.fill(&WHITE)?;
    let root = root.titled(TITLE, ("sans-serif", 22))?;
    let panels = root.split_evenly((2, 4));

    draw_size_panel(&panels[0], data, SizePanel::Retained)?;
    draw_uc_depth_panel(&panels[1], data)?;
    draw_pore_panel(&panels[2], data)?;
    draw_screen_panel(&panels[3], data)?;
    draw_size_panel(&panels[4], data, SizePanel::Cumulative)?;
    draw_uc_d50_panel(&panels[5], data)?;
    draw_proppant_ratio_panel(&panels[6], data)?;
    draw_gravel_panel(&panels[7], data)?;

    root.present()?;
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SizePanel {
    Retained,
    Cumulative,
}

fn draw_size_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData, panel: SizePanel) -> PanelResult {
    let pick = |s: &FigureSample| match panel {
        SizePanel::Retained => s.retained.clone(),
        SizePanel::Cumulative => s.cumulative.clone(),
    };
    let sizes: Vec<f64> = data
        .samples
        .iter()
        .flat_map(|s| s.retained.iter().map(|(x, _)| *x))
        .collect();
    let (x_lo, x_hi) = log_range(&sizes);
    let y_hi = match panel {
        SizePanel::Cumulative => 100.0,
        SizePanel::Retained => {
            let max = data
                .samples
                .iter()
                .flat_map(|s| s.retained.iter().map(|(_, w)| *w))
                .fold(0.0, f64::max);
            if max > 0.0 { max * 1.1 } else { 1.0 }
        }
    };
    let (caption, y_desc) = match panel {
        SizePanel::Retained => ("Weight retained", "Weight retained"),
        SizePanel::Cumulative => ("Cumulative weight retained", "Cumulative %"),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d((x_lo..x_hi).log_scale(), 0.0..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Grain size (micron)")
        .y_desc(y_desc)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    for (_, boundary) in WENTWORTH_BOUNDARIES {
        if boundary <= x_lo || boundary >= x_hi {
            continue;
        }
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(boundary, 0.0), (boundary, y_hi)],
            BLACK.mix(0.25),
        )))?;
    }
    for (grade, boundary) in WENTWORTH_BOUNDARIES {
        if boundary <= x_lo || boundary >= x_hi {
            continue;
        }
        chart.draw_series(std::iter::once(Text::new(
            grade.label().to_string(),
            (boundary, y_hi * 0.97),
            ("sans-serif", 10).into_font().color(&BLACK.mix(0.6)),
        )))?;
    }

    for (idx, sample) in data.samples.iter().enumerate() {
        let color = Palette99::pick(idx).mix(1.0);
        let pts: Vec<(f64, f64)> = pick(sample).into_iter().filter(|(x, _)| *x > 0.0).collect();
        let series = chart.draw_series(LineSeries::new(pts, color.stroke_width(2)))?;
        if panel == SizePanel::Retained {
            series
                .label(sample.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color));
        }
    }

    if panel == SizePanel::Retained {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 11))
            .draw()?;
    }
    Ok(())
}

fn draw_uc_depth_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    let ucs: Vec<f64> = data.samples.iter().map(|s| s.stats.uniformity_coeff).collect();
    let (x_lo, x_hi) = linear_range(&ucs, &uniformity_marks());
    let (d_lo, d_hi) = depth_axis(data);

    let mut chart = ChartBuilder::on(area)
        .caption("Uniformity vs depth", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, d_lo..d_hi)?;

    chart
        .configure_mesh()
        .x_desc("Uniformity coefficient")
        .y_desc("Depth")
        .y_label_formatter(&|v| format!("{:.0}", -v))
        .draw()?;

    draw_vertical_marks(&mut chart, &uniformity_labels(), d_lo, d_hi, BLACK.mix(0.3))?;

    chart.draw_series(
        data.samples
            .iter()
            .enumerate()
            .map(|(i, s)| Circle::new((s.stats.uniformity_coeff, -s.depth), 4, Palette99::pick(i).filled())),
    )?;
    Ok(())
}

fn draw_uc_d50_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    let ucs: Vec<f64> = data.samples.iter().map(|s| s.stats.uniformity_coeff).collect();
    let d50s: Vec<f64> = data.samples.iter().map(|s| s.stats.d50).collect();
    let (x_lo, x_hi) = linear_range(&ucs, &uniformity_marks());
    let (y_lo, y_hi) = linear_range(&d50s, &[]);

    let mut chart = ChartBuilder::on(area)
        .caption("Uniformity vs D50", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Uniformity coefficient")
        .y_desc("D50 (micron)")
        .draw()?;

    draw_vertical_marks(&mut chart, &uniformity_labels(), y_lo, y_hi, BLACK.mix(0.3))?;

    chart.draw_series(
        data.samples
            .iter()
            .enumerate()
            .map(|(i, s)| Circle::new((s.stats.uniformity_coeff, s.stats.d50), 4, Palette99::pick(i).filled())),
    )?;
    Ok(())
}

fn draw_pore_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    let series: [(&str, fn(&SieveStatistics) -> f64); 4] = [
        ("Average formation pore", |s| s.average_formation_pore),
        ("Mobile fines size", |s| s.mobile_fines_size),
        ("Smallest particle to bridge", |s| s.smallest_particle_to_bridge),
        ("Largest particle to pass", |s| s.largest_particle_thru_pore),
    ];

    let mut values: Vec<f64> = Vec::new();
    for (_, get) in &series {
        values.extend(data.samples.iter().map(|s| get(&s.stats)));
    }
    values.extend(data.samples.iter().map(|s| s.stats.mobile_fines_coeff));
    let (x_lo, x_hi) = linear_range(&values, &[0.0]);
    let (d_lo, d_hi) = depth_axis(data);

    let mut chart = ChartBuilder::on(area)
        .caption("Grain & pore size", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, d_lo..d_hi)?;

    chart
        .configure_mesh()
        .x_desc("Size (micron)")
        .y_desc("Depth")
        .y_label_formatter(&|v| format!("{:.0}", -v))
        .draw()?;

    for (idx, (label, get)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).mix(1.0);
        chart
            .draw_series(LineSeries::new(
                data.samples.iter().map(|s| (get(&s.stats), -s.depth)),
                color.stroke_width(2),
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color));
    }

    let coeff_color = BLACK;
    chart
        .draw_series(
            data.samples
                .iter()
                .map(|s| Circle::new((s.stats.mobile_fines_coeff, -s.depth), 3, coeff_color.filled())),
        )?
        .label("Mobile fines coefficient")
        .legend(move |(x, y)| Circle::new((x + 9, y), 3, coeff_color.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 10))
        .draw()?;
    Ok(())
}

fn draw_proppant_ratio_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    let n = data.proppants.len();
    let x_hi = n.max(1) as f64 - 0.5;

    let mut ratios: Vec<f64> = Vec::new();
    for s in &data.samples {
        ratios.extend(data.proppants.iter().map(|(_, d50)| d50 / s.stats.d50));
    }
    let (_, y_hi) = linear_range(&ratios, &RATIO_LINES);

    let names: Vec<String> = data.proppants.iter().map(|(name, _)| name.clone()).collect();
    let caption = if n == 0 { "Proppant D50/d50 (none selected)" } else { "Proppant D50/d50" };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5..x_hi, 0.0..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Proppant")
        .y_desc("D50/d50")
        .x_labels(n.max(1))
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            names.get(idx as usize).cloned().unwrap_or_default()
        })
        .draw()?;

    for ratio in RATIO_LINES {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, ratio), (x_hi, ratio)],
            RED.stroke_width(1),
        )))?;
    }

    for (i, s) in data.samples.iter().enumerate() {
        let color = Palette99::pick(i).filled();
        chart.draw_series(
            data.proppants
                .iter()
                .enumerate()
                .map(move |(j, (_, d50))| Circle::new((j as f64, d50 / s.stats.d50), 4, color)),
        )?;
    }
    Ok(())
}

fn draw_screen_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    let d10s: Vec<f64> = data.samples.iter().map(|s| s.stats.d10).collect();
    let marks: Vec<f64> = data.screens.iter().map(|(_, a)| *a).collect();
    let (x_lo, x_hi) = linear_range(&d10s, &marks);
    let (d_lo, d_hi) = depth_axis(data);

    let mut chart = ChartBuilder::on(area)
        .caption("D10 and screen aperture", ("sans-serif", 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, d_lo..d_hi)?;

    chart
        .configure_mesh()
        .x_desc("Size (micron)")
        .y_desc("Depth")
        .y_label_formatter(&|v| format!("{:.0}", -v))
        .draw()?;

    let labels: Vec<(f64, String)> = data.screens.iter().map(|(n, a)| (*a, n.clone())).collect();
    draw_vertical_marks(&mut chart, &labels, d_lo, d_hi, RED.mix(1.0))?;

    chart.draw_series(
        data.samples
            .iter()
            .enumerate()
            .map(|(i, s)| Circle::new((s.stats.d10, -s.depth), 4, Palette99::pick(i).filled())),
    )?;
    Ok(())
}

fn draw_gravel_panel(area: &DrawingArea<SVGBackend, Shift>, data: &FigureData) -> PanelResult {
    let gravel: Vec<f64> = data.samples.iter().map(|s| s.stats.recommended_gravel_d50).collect();
    let marks: Vec<f64> = data.proppants.iter().map(|(_, d)| *d).collect();
    let (x_lo, x_hi) = linear_range(&gravel, &marks);
    let (d_lo, d_hi) = depth_axis(data);

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("{}xD50 and proppant D50", data.design.gravel_multiplier),
            ("sans-serif", 16),
        )
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, d_lo..d_hi)?;

    chart
        .configure_mesh()
        .x_desc("Size (micron)")
        .y_desc("Depth")
        .y_label_formatter(&|v| format!("{:.0}", -v))
        .draw()?;

    let labels: Vec<(f64, String)> = data.proppants.iter().map(|(n, d)| (*d, n.clone())).collect();
    draw_vertical_marks(&mut chart, &labels, d_lo, d_hi, RED.mix(1.0))?;

    chart.draw_series(
        data.samples
            .iter()
            .enumerate()
            .map(|(i, s)| Circle::new((s.stats.recommended_gravel_d50, -s.depth), 4, Palette99::pick(i).filled())),
    )?;
    Ok(())
}

fn draw_vertical_marks<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    marks: &[(f64, String)],
    y_lo: f64,
    y_hi: f64,
    color: RGBAColor,
) -> PanelResult
where
    DB::ErrorType: 'static,
{
    let text_y = y_hi - 0.03 * (y_hi - y_lo);
    for (x, label) in marks {
        chart.draw_series(std::iter::once(PathElement::new(vec![(*x, y_lo), (*x, y_hi)], color)))?;
        chart.draw_series(std::iter::once(Text::new(
            label.clone(),
            (*x, text_y),
            ("sans-serif", 10).into_font().color(&color),
        )))?;
    }
    Ok(())
}

fn uniformity_marks() -> Vec<f64> {
    UNIFORMITY_BOUNDARIES.iter().map(|(_, b)| *b).collect()
}

fn uniformity_labels() -> Vec<(f64, String)> {
    UNIFORMITY_BOUNDARIES
        .iter()
        .map(|(class, b)| (*b, class.label().to_string()))
        .collect()
}

/// Negated depth range so depth increases downwards.
fn depth_axis(data: &FigureData) -> (f64, f64) {
    let depths: Vec<f64> = data.samples.iter().map(|s| s.depth).collect();
    let (lo, hi) = linear_range(&depths, &[]);
    (-hi, -lo)
}

/// Padded range covering `values` and `marks`; never empty.
fn linear_range(values: &[f64], marks: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.iter().chain(marks).copied().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.08 } else { (hi.abs() * 0.1).max(1.0) };
    (lo - pad, hi + pad)
}

/// Range for a log axis over the positive entries of `values`.
fn log_range(values: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.iter().copied().filter(|v| v.is_finite() && *v > 0.0) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return (1.0, 10_000.0);
    }
    (lo / 1.5, hi * 1.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(d50: f64, uc: f64) -> SieveStatistics {
        SieveStatistics {
            d5: d50 * 3.0,
            d10: d50 * 2.0,
            d40: d50 * 1.1,
            d50,
            d90: d50 * 1.1 / uc,
            d95: d50 / 4.0,
            uniformity_coeff: uc,
            sorting_factor: 8.0,
            effective_size: d50 / uc,
            mobile_fines_coeff: 4.0,
            mobile_fines_size: d50 / 10.0,
            average_formation_pore: d50 / 6.5,
            smallest_particle_to_bridge: d50 / 19.5,
            largest_particle_thru_pore: d50 / 45.5,
            recommended_gravel_d50: d50 * 6.0,
            recommended_frac_d50: d50 * 8.0,
        }
    }

    fn sample(name: &str, depth: f64, d50: f64) -> FigureSample {
        FigureSample {
            name: name.to_string(),
            depth,
            retained: vec![(2000.0, 5.0), (1000.0, 15.0), (500.0, 30.0), (250.0, 30.0), (125.0, 15.0)],
            cumulative: vec![(2000.0, 5.0), (1000.0, 20.0), (500.0, 50.0), (250.0, 80.0), (125.0, 95.0)],
            stats: stats(d50, 4.0),
        }
    }

    #[test]
    fn renders_all_panels_to_svg() {
        let data = FigureData {
            samples: vec![sample("S1", 2450.0, 500.0), sample("S2", 2460.0, 420.0)],
            screens: vec![("WWS 150".to_string(), 150.0)],
            proppants: vec![("Gravel 20/40".to_string(), 650.0), ("Frac 16/30".to_string(), 900.0)],
            design: DesignFactors::default(),
        };
        let svg = render_figure_svg(&data).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(TITLE));
        assert!(svg.contains("WWS 150"));
        assert!(svg.contains("Gravel 20/40"));
        assert!(svg.contains("MG Sand"));
    }

    #[test]
    fn single_sample_without_selections_still_renders() {
        let data = FigureData {
            samples: vec![sample("Only", 1000.0, 300.0)],
            screens: vec![],
            proppants: vec![],
            design: DesignFactors::default(),
        };
        let svg = render_figure_svg(&data).unwrap();
        assert!(svg.contains("none selected"));
    }

    #[test]
    fn empty_figure_is_no_data() {
        let data = FigureData {
            samples: vec![],
            screens: vec![],
            proppants: vec![],
            design: DesignFactors::default(),
        };
        assert_eq!(render_figure_svg(&data).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn ranges_are_padded_and_never_empty() {
        assert_eq!(linear_range(&[], &[]), (0.0, 1.0));
        let (lo, hi) = linear_range(&[5.0], &[]);
        assert!(lo < 5.0 && hi > 5.0);
        let (lo, hi) = log_range(&[0.0, 100.0, 1000.0]);
        assert!((lo - 100.0 / 1.5).abs() < 1e-9 && (hi - 1500.0).abs() < 1e-9);
    }
}
