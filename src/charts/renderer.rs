//! Static Chart Renderer
//! Draws the stacked bar chart and scatter grid to PNG or SVG files with plotters.
//!
//! Charts:
//! 1. Stacked bar chart: one bar per year, one stacked segment per cause
//!    column (ranked causes first, `Others` on top), legend upper left.
//! 2. Scatter grid: one panel per cause column (two per row), one colour per
//!    entity, x = year, y = death count.

use crate::charts::{ScatterPanel, StackedSeries};
use crate::data::YearRange;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Series colours, in stacking order.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

/// Half the width of a yearly bar, in years.
const BAR_HALF_WIDTH: f64 = 0.4;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to draw: {0}")]
    Empty(String),
    #[error("Unsupported chart format '{0}' (use .png or .svg)")]
    UnsupportedFormat(String),
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

fn render_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Result<Self, ChartError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(ChartFormat::Png),
            "svg" => Ok(ChartFormat::Svg),
            _ => Err(ChartError::UnsupportedFormat(ext)),
        }
    }
}

/// Image size and stacked bar title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartStyle {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

fn default_width() -> u32 {
    1400
}

fn default_height() -> u32 {
    800
}

fn default_title() -> String {
    "Stacked Bar Chart of Causes of Death (Worldwide)".to_string()
}

/// Compact axis label for death counts: 1500 -> "1.5k", 2300000 -> "2.3M".
pub fn format_count(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

fn padded_max(value: f64) -> f64 {
    if value > 0.0 {
        value * 1.05
    } else {
        1.0
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the aggregated table as a stacked bar chart.
    ///
    /// Only years present in `marks` get an axis label; with no marks every
    /// bar is labelled.
    pub fn render_stacked_bar(
        data: &StackedSeries,
        style: &ChartStyle,
        marks: &[(i64, String)],
        path: &Path,
    ) -> Result<(), ChartError> {
        if data.is_empty() {
            return Err(ChartError::Empty("aggregated table has no rows".to_string()));
        }

        let size = (style.width, style.height);
        match ChartFormat::from_path(path)? {
            ChartFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                Self::draw_stacked_bar(&root, data, style, marks)?;
                root.present().map_err(render_err)?;
            }
            ChartFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                Self::draw_stacked_bar(&root, data, style, marks)?;
                root.present().map_err(render_err)?;
            }
        }

        info!("Stacked bar chart written to {}", path.display());
        Ok(())
    }

    /// Render scatter panels in a two-column grid.
    pub fn render_scatter_grid(
        panels: &[ScatterPanel],
        style: &ChartStyle,
        path: &Path,
    ) -> Result<(), ChartError> {
        if panels.iter().all(|p| p.points_by_entity.is_empty()) {
            return Err(ChartError::Empty("no scatter points".to_string()));
        }

        let size = (style.width, style.height);
        match ChartFormat::from_path(path)? {
            ChartFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                Self::draw_scatter_grid(&root, panels)?;
                root.present().map_err(render_err)?;
            }
            ChartFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                Self::draw_scatter_grid(&root, panels)?;
                root.present().map_err(render_err)?;
            }
        }

        info!(
            "Scatter grid with {} panels written to {}",
            panels.len(),
            path.display()
        );
        Ok(())
    }

    fn draw_stacked_bar<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &StackedSeries,
        style: &ChartStyle,
        marks: &[(i64, String)],
    ) -> Result<(), ChartError> {
        root.fill(&WHITE).map_err(render_err)?;

        let first = data.years.iter().copied().min().unwrap_or_default() as f64;
        let last = data.years.iter().copied().max().unwrap_or_default() as f64;
        let y_max = padded_max(data.bar_totals().into_iter().fold(0.0, f64::max));

        let mut chart = ChartBuilder::on(root)
            .caption(&style.title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((first - 0.5)..(last + 0.5), 0f64..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Year")
            .y_desc("Death Count")
            .x_labels(data.years.len())
            .x_label_formatter(&|x: &f64| Self::bar_label(x.round() as i64, marks))
            .y_label_formatter(&|y: &f64| format_count(*y))
            .draw()
            .map_err(render_err)?;

        let segments = data.segments();
        for (index, series) in data.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            chart
                .draw_series(
                    segments
                        .iter()
                        .filter(|s| s.series_index == index)
                        .map(|s| {
                            let x = s.year as f64;
                            Rectangle::new(
                                [(x - BAR_HALF_WIDTH, s.bottom), (x + BAR_HALF_WIDTH, s.top)],
                                color.filled(),
                            )
                        }),
                )
                .map_err(render_err)?
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)?;

        Ok(())
    }

    fn bar_label(year: i64, marks: &[(i64, String)]) -> String {
        if marks.is_empty() {
            return YearRange::mark_label(year);
        }
        marks
            .iter()
            .find(|(mark, _)| *mark == year)
            .map(|(_, label)| label.clone())
            .unwrap_or_default()
    }

    fn draw_scatter_grid<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        panels: &[ScatterPanel],
    ) -> Result<(), ChartError> {
        root.fill(&WHITE).map_err(render_err)?;

        let rows = panels.len().div_ceil(2).max(1);
        let areas = root.split_evenly((rows, 2));

        for (area, panel) in areas.iter().zip(panels) {
            let Some((first, last)) = panel.year_bounds() else {
                debug!("No points for '{}', leaving panel blank", panel.column);
                continue;
            };

            let mut chart = ChartBuilder::on(area)
                .caption(&panel.title, ("sans-serif", 16))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(60)
                .build_cartesian_2d(
                    (first as f64 - 0.5)..(last as f64 + 0.5),
                    0f64..padded_max(panel.max_value()),
                )
                .map_err(render_err)?;

            chart
                .configure_mesh()
                .x_label_formatter(&|x: &f64| YearRange::mark_label(x.round() as i64))
                .y_label_formatter(&|y: &f64| format_count(*y))
                .draw()
                .map_err(render_err)?;

            for (index, points) in panel.points_by_entity.values().enumerate() {
                let color = Palette99::pick(index).filled();
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&(year, value)| Circle::new((year as f64, value), 2, color)),
                    )
                    .map_err(render_err)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ChartFormat::from_path(Path::new("out/chart.PNG")).unwrap(),
            ChartFormat::Png
        );
        assert_eq!(
            ChartFormat::from_path(Path::new("chart.svg")).unwrap(),
            ChartFormat::Svg
        );
        assert!(matches!(
            ChartFormat::from_path(Path::new("chart.pdf")),
            Err(ChartError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
    }

    #[test]
    fn test_bar_labels_follow_marks() {
        let marks = YearRange::default().marks();
        assert_eq!(StaticChartRenderer::bar_label(1990, &marks), "'90");
        assert_eq!(StaticChartRenderer::bar_label(1991, &marks), "");
        assert_eq!(StaticChartRenderer::bar_label(1991, &[]), "'91");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(950.0), "950");
        assert_eq!(format_count(1500.0), "1.5k");
        assert_eq!(format_count(2_300_000.0), "2.3M");
        assert_eq!(format_count(7.1e9), "7.1B");
    }

    #[test]
    fn test_empty_data_is_rejected_before_drawing() {
        let data = StackedSeries {
            years: Vec::new(),
            series: Vec::new(),
        };
        let err = StaticChartRenderer::render_stacked_bar(
            &data,
            &ChartStyle::default(),
            &[],
            Path::new("unused.png"),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Empty(_)));
    }
}
