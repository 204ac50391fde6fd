//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - cumulative curve of each sample: `-` line, sieve points marked `1`, `2`, ...
//! - Wentworth grade boundaries inside the size range: `:`

use crate::domain::{SampleRecord, WENTWORTH_BOUNDARIES};

const MARKERS: &[u8] = b"123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Render cumulative weight % against log grain size for every calculated sample.
pub fn render_cumulative_plot(samples: &[&SampleRecord], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let series: Vec<(&SampleRecord, Vec<(f64, f64)>)> = samples
        .iter()
        .filter_map(|r| {
            let pts = curve_points(r);
            (!pts.is_empty()).then_some((*r, pts))
        })
        .collect();

    let Some((s_min, s_max)) = size_range(&series) else {
        return "No calculated samples to plot.\n".to_string();
    };
    let (lx_min, lx_max) = (s_min.log10(), s_max.log10());

    let mut grid = vec![vec![' '; width]; height];

    for (_, pts) in &series {
        let mut prev = None;
        for &(size, cum) in pts {
            let x = map_x(size.log10(), lx_min, lx_max, width);
            let y = map_y(cum, 0.0, 100.0, height);
            match prev {
                Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, '-'),
                None => grid[y][x] = '-',
            }
            prev = Some((x, y));
        }
    }

    for (_, boundary) in WENTWORTH_BOUNDARIES {
        if boundary <= s_min || boundary >= s_max {
            continue;
        }
        let x = map_x(boundary.log10(), lx_min, lx_max, width);
        for row in grid.iter_mut() {
            if row[x] == ' ' {
                row[x] = ':';
            }
        }
    }

    for (idx, (_, pts)) in series.iter().enumerate() {
        let marker = marker(idx);
        for &(size, cum) in pts {
            let x = map_x(size.log10(), lx_min, lx_max, width);
            let y = map_y(cum, 0.0, 100.0, height);
            grid[y][x] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: size=[{s_min:.1}, {s_max:.1}] micron (log) | cumulative=[0, 100]%\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (idx, (r, _)) in series.iter().enumerate() {
        out.push_str(&format!("{} = {} @ {:.2}\n", marker(idx), r.name, r.depth));
    }

    out
}

fn marker(idx: usize) -> char {
    MARKERS[idx % MARKERS.len()] as char
}

/// (size micron, cumulative %) pairs with a usable log size.
fn curve_points(r: &SampleRecord) -> Vec<(f64, f64)> {
    if r.cumulative_wt_perc.len() != r.sieve_sizes_micron.len() {
        return Vec::new();
    }
    r.sieve_sizes_micron
        .iter()
        .zip(r.cumulative_wt_perc.iter())
        .filter(|(s, c)| **s > 0.0 && s.is_finite() && c.is_finite())
        .map(|(&s, &c)| (s, c))
        .collect()
}

fn size_range(series: &[(&SampleRecord, Vec<(f64, f64)>)]) -> Option<(f64, f64)> {
    let mut min_s = f64::INFINITY;
    let mut max_s = f64::NEG_INFINITY;
    for (_, pts) in series {
        for &(s, _) in pts {
            min_s = min_s.min(s);
            max_s = max_s.max(s);
        }
    }
    if min_s.is_finite() && max_s.is_finite() && max_s > min_s {
        Some((min_s, max_s))
    } else {
        None
    }
}

fn map_x(v: f64, v_min: f64, v_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((v - v_min) / (v_max - v_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
