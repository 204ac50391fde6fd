//! Plotting: terminal ASCII curves and the SVG comparison figure.

pub mod ascii;
pub mod figure;

pub use ascii::render_cumulative_plot;
pub use figure::{FigureData, render_figure_svg, write_figure_svg};
