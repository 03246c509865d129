//! Static Chart Renderer
//! Draws the shaped accident tables into PNG images with plotters.
//!
//! Layout:
//! 1. Consequences: four stacked bar panels sharing the region order
//! 2. Damage: one grouped bar panel per region (damage bucket x cause), log scale
//! 3. Surface: one line panel per region, a line per surface condition

use crate::aggregate::{
    CrossTab, MonthlyCategoryCount, RegionAggregator, RegionSummary, TimeBucketer,
};
use crate::charts::RegionPanel;
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(255, 87, 34),   // Deep Orange
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

const FONT: &str = "sans-serif";

/// Only every n-th month gets an axis label.
const MONTH_LABEL_STEP: usize = 12;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to prepare output {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Failed to open {path}: {source}")]
    Show {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(err.to_string())
    }
}

/// Where a chart goes once drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartOutput {
    /// Image file; parent directories are created when missing.
    pub path: Option<PathBuf>,
    /// Open the image with the system viewer afterwards.
    pub show: bool,
}

impl ChartOutput {
    pub fn new(path: Option<PathBuf>, show: bool) -> Self {
        Self { path, show }
    }

    /// File the chart is written to, if any. Showing without a path renders
    /// into the temp directory.
    pub fn target(&self, fallback_name: &str) -> Option<PathBuf> {
        match (&self.path, self.show) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(std::env::temp_dir().join(fallback_name)),
            (None, false) => None,
        }
    }
}

/// Create the parent directories of `path`.
pub fn prepare_path(path: &Path) -> Result<(), RenderError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Rendering collaborator for the three accident charts.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Bar panels for deaths, severe injuries, light injuries and accident counts.
    pub fn render_consequences(
        summaries: &[RegionSummary],
        output: &ChartOutput,
    ) -> Result<Option<PathBuf>, RenderError> {
        Self::emit(output, "01_consequences.png", |path| {
            let root = BitMapBackend::new(path, (650, 950)).into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled("Accident consequences by region", (FONT, 22))?;

            let regions = RegionAggregator::order(summaries);
            let clamp = |v: i64| v.max(0) as u64;
            let series: [(&str, Vec<u64>); 4] = [
                ("Deaths", summaries.iter().map(|s| clamp(s.deaths)).collect()),
                (
                    "Severely injured",
                    summaries.iter().map(|s| clamp(s.severe_injuries)).collect(),
                ),
                (
                    "Lightly injured",
                    summaries.iter().map(|s| clamp(s.light_injuries)).collect(),
                ),
                ("Accidents", summaries.iter().map(|s| s.accidents).collect()),
            ];

            for (i, (area, (label, values))) in
                root.split_evenly((4, 1)).iter().zip(series.iter()).enumerate()
            {
                Self::draw_bar_panel(area, &regions, values, label, PALETTE[i])?;
            }

            root.present()?;
            Ok(())
        })
    }

    /// Grouped bars of damage bucket x cause, one panel per region.
    pub fn render_damage(
        panels: &[RegionPanel<CrossTab>],
        output: &ChartOutput,
    ) -> Result<Option<PathBuf>, RenderError> {
        Self::emit(output, "02_damage.png", |path| {
            let root = BitMapBackend::new(path, (1300, 1000)).into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled("Accident cause and damage", (FONT, 24))?;

            let y_top = panels
                .iter()
                .map(|p| p.data.max_count())
                .max()
                .unwrap_or(0)
                .max(10) as f64
                * 2.0;

            let areas = root.split_evenly(Self::grid(panels.len()));
            for (i, (area, panel)) in areas.iter().zip(panels).enumerate() {
                Self::draw_grouped_panel(area, panel, y_top, i + 1 == panels.len())?;
            }

            root.present()?;
            Ok(())
        })
    }

    /// Monthly line per surface condition, one panel per region.
    pub fn render_surface(
        panels: &[RegionPanel<Vec<MonthlyCategoryCount>>],
        categories: &[&str],
        output: &ChartOutput,
    ) -> Result<Option<PathBuf>, RenderError> {
        Self::emit(output, "03_surface.png", |path| {
            let root = BitMapBackend::new(path, (1500, 1000)).into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled("Road surface condition over time", (FONT, 24))?;

            // Shared month axis so panels stay comparable.
            let months = TimeBucketer::months(panels.iter().flat_map(|p| &p.data));

            let areas = root.split_evenly(Self::grid(panels.len()));
            for (i, (area, panel)) in areas.iter().zip(panels).enumerate() {
                Self::draw_timeline_panel(area, panel, &months, categories, i == 0)?;
            }

            root.present()?;
            Ok(())
        })
    }

    fn emit<F>(output: &ChartOutput, fallback_name: &str, draw: F) -> Result<Option<PathBuf>, RenderError>
    where
        F: FnOnce(&Path) -> Result<(), RenderError>,
    {
        let Some(path) = output.target(fallback_name) else {
            debug!("No output requested for {fallback_name}");
            return Ok(None);
        };

        prepare_path(&path)?;
        draw(&path)?;
        info!("Saved {}", path.display());

        if output.show {
            open::that(&path).map_err(|source| RenderError::Show {
                path: path.clone(),
                source,
            })?;
        }

        Ok(Some(path))
    }

    /// Rows and columns for `panels` panels, two per row.
    fn grid(panels: usize) -> (usize, usize) {
        let columns = if panels > 1 { 2 } else { 1 };
        (panels.max(1).div_ceil(columns), columns)
    }

    fn draw_bar_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        categories: &[String],
        values: &[u64],
        y_desc: &str,
        color: RGBColor,
    ) -> Result<(), RenderError> {
        let y_max = values.iter().copied().max().unwrap_or(0).max(1);
        let slots = categories.len().max(1);

        let mut chart = ChartBuilder::on(area)
            .margin(8)
            .x_label_area_size(25)
            .y_label_area_size(60)
            .build_cartesian_2d((0..slots).into_segmented(), 0u64..y_max + y_max / 10 + 1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .x_labels(slots)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => categories.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(6)
                .data(values.iter().enumerate().map(|(i, v)| (i, *v))),
        )?;

        Ok(())
    }

    fn draw_grouped_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        panel: &RegionPanel<CrossTab>,
        y_top: f64,
        with_legend: bool,
    ) -> Result<(), RenderError> {
        let table = &panel.data;
        let groups = table.row_labels.len().max(1);
        let width = 0.8 / table.column_labels.len().max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.region, (FONT, 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5..(groups as f64 - 0.5), (0.5..y_top).log_scale())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Damage [thousand CZK]")
            .y_desc("Count")
            .x_labels(groups + 1)
            .x_label_formatter(&|x| {
                let nearest = x.round();
                if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
                    return String::new();
                }
                table
                    .row_labels
                    .get(nearest as usize)
                    .map(|l| l.to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()?;

        for (c, cause) in table.column_labels.iter().enumerate() {
            let color = PALETTE[c % PALETTE.len()];
            let bars = table.counts.iter().enumerate().filter_map(|(r, row)| {
                let count = row.get(c).copied().unwrap_or(0);
                if count == 0 {
                    return None;
                }
                let x0 = r as f64 - 0.4 + c as f64 * width;
                Some(Rectangle::new(
                    [(x0, 0.5), (x0 + width, count as f64)],
                    color.filled(),
                ))
            });
            chart
                .draw_series(bars)?
                .label(*cause)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        if with_legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        Ok(())
    }

    fn draw_timeline_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        panel: &RegionPanel<Vec<MonthlyCategoryCount>>,
        months: &[String],
        categories: &[&str],
        with_legend: bool,
    ) -> Result<(), RenderError> {
        let slots = months.len().max(1);
        let y_max = panel.data.iter().map(|r| r.count).max().unwrap_or(0).max(1);

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.region, (FONT, 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0..slots, 0u64..y_max + y_max / 10 + 1)?;

        chart
            .configure_mesh()
            .y_desc("Accidents")
            .x_labels(slots)
            .x_label_formatter(&|i| {
                if i % MONTH_LABEL_STEP == 0 {
                    months.get(*i).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .draw()?;

        for (c, category) in categories.iter().enumerate() {
            let points: Vec<(usize, u64)> = panel
                .data
                .iter()
                .filter(|r| r.category == *category)
                .filter_map(|r| {
                    months
                        .iter()
                        .position(|m| *m == r.month)
                        .map(|i| (i, r.count))
                })
                .collect();
            if points.is_empty() {
                continue;
            }

            let color = PALETTE[c % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(*category)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2))
                });
        }

        if with_legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        Ok(())
    }
}
