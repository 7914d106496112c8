//! Chart Renderer
//! Draws a prepared chart to a PNG file.
//!
//! Layout:
//! 1. Title centered on top
//! 2. Axis descriptions from the column names
//! 3. Categorical axes list at most `MAX_CATEGORIES` labels

use crate::charts::plotter::{ChartData, ChartError, PreparedChart};
use crate::stats::{BoxSummary, CrossTab};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, instrument};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 800;

// Same blue the bars, boxes and points share
const ACCENT: RGBColor = RGBColor(91, 155, 213);

// In category units, so neighbouring boxes never touch
const BOX_HALF_WIDTH: f64 = 0.3;

fn render_err<E: Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Pads a range so single values and edge points stay visible.
fn padded(min: f64, max: f64) -> Range<f64> {
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn bounds<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Label at an integer position of a categorical axis.
fn index_label(labels: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Renders prepared charts with plotters' bitmap backend.
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(WIDTH, HEIGHT)
    }
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Write `chart` to `path` as a PNG, creating parent directories.
    #[instrument(level = "debug", skip(self, chart), fields(kind = ?chart.kind))]
    pub fn render(&self, chart: &PreparedChart, path: &Path) -> Result<(), ChartError> {
        if chart.is_empty() {
            return Err(ChartError::NoData(chart.title.clone()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        match &chart.data {
            ChartData::Scatter { points } => Self::draw_scatter(&root, chart, points)?,
            ChartData::Box { groups, summaries } => {
                Self::draw_box(&root, chart, groups, summaries)?
            }
            ChartData::Bar { counts } => Self::draw_bar(&root, chart, counts)?,
            ChartData::Heatmap(tab) => Self::draw_heatmap(&root, chart, tab)?,
        }

        root.present().map_err(render_err)?;
        debug!(path = %path.display(), "chart written");
        Ok(())
    }

    fn draw_scatter(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        chart: &PreparedChart,
        points: &[(f64, f64)],
    ) -> Result<(), ChartError> {
        let (x_min, x_max) = bounds(points.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
        let (y_min, y_max) = bounds(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(padded(x_min, x_max), padded(y_min, y_max))
            .map_err(render_err)?;

        ctx.configure_mesh()
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .draw()
            .map_err(render_err)?;

        ctx.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, ACCENT.mix(0.6).filled())),
        )
        .map_err(render_err)?;
        Ok(())
    }

    fn draw_box(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        chart: &PreparedChart,
        groups: &[(String, Vec<f64>)],
        summaries: &[BoxSummary],
    ) -> Result<(), ChartError> {
        let labels: Vec<String> = summaries.iter().map(|s| s.group.clone()).collect();
        let (lo, hi) = bounds(groups.iter().flat_map(|(_, values)| values.iter().copied()))
            .unwrap_or((0.0, 1.0));
        let n = labels.len() as f64;

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(n - 0.5), padded(lo, hi))
            .map_err(render_err)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_labels(labels.len())
            .x_label_formatter(&|v: &f64| index_label(&labels, *v))
            .draw()
            .map_err(render_err)?;

        let half = BOX_HALF_WIDTH;
        for (i, summary) in summaries.iter().enumerate() {
            let x = i as f64;
            let line = ACCENT.stroke_width(2);

            ctx.draw_series(std::iter::once(Rectangle::new(
                [(x - half, summary.q1), (x + half, summary.q3)],
                ACCENT.mix(0.3).filled(),
            )))
            .map_err(render_err)?;
            ctx.draw_series(
                [
                    vec![
                        (x - half, summary.q1),
                        (x + half, summary.q1),
                        (x + half, summary.q3),
                        (x - half, summary.q3),
                        (x - half, summary.q1),
                    ],
                    vec![(x - half, summary.median), (x + half, summary.median)],
                    vec![(x, summary.q3), (x, summary.whisker_high)],
                    vec![(x, summary.q1), (x, summary.whisker_low)],
                    vec![
                        (x - half / 2.0, summary.whisker_high),
                        (x + half / 2.0, summary.whisker_high),
                    ],
                    vec![
                        (x - half / 2.0, summary.whisker_low),
                        (x + half / 2.0, summary.whisker_low),
                    ],
                ]
                .into_iter()
                .map(|points| PathElement::new(points, line)),
            )
            .map_err(render_err)?;

            if summary.outliers > 0 {
                let values = groups
                    .iter()
                    .find(|(group, _)| *group == summary.group)
                    .map(|(_, values)| values.as_slice())
                    .unwrap_or_default();
                ctx.draw_series(
                    values
                        .iter()
                        .filter(|&&v| v < summary.whisker_low || v > summary.whisker_high)
                        .map(|&v| Circle::new((x, v), 3, ACCENT.stroke_width(1))),
                )
                .map_err(render_err)?;
            }
        }
        Ok(())
    }

    fn draw_bar(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        chart: &PreparedChart,
        counts: &[(String, usize)],
    ) -> Result<(), ChartError> {
        let labels: Vec<String> = counts.iter().map(|(label, _)| label.clone()).collect();
        let top = counts.iter().map(|(_, n)| *n).max().unwrap_or(0) as u32;
        let n = labels.len() as u32;

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..n).into_segmented(), 0u32..(top + top / 10 + 1))
            .map_err(render_err)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_labels(labels.len())
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                    labels.get(*i as usize).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .draw()
            .map_err(render_err)?;

        ctx.draw_series(
            Histogram::vertical(&ctx)
                .style(ACCENT.filled())
                .margin(8)
                .data(counts.iter().enumerate().map(|(i, (_, n))| (i as u32, *n as u32))),
        )
        .map_err(render_err)?;
        Ok(())
    }

    fn draw_heatmap(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        chart: &PreparedChart,
        tab: &CrossTab,
    ) -> Result<(), ChartError> {
        let nx = tab.x_labels.len() as f64;
        let ny = tab.y_labels.len() as f64;
        let max = tab.max_count().max(1) as f64;

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(-0.5..(nx - 0.5), -0.5..(ny - 0.5))
            .map_err(render_err)?;

        ctx.configure_mesh()
            .disable_mesh()
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_labels(tab.x_labels.len())
            .y_labels(tab.y_labels.len())
            .x_label_formatter(&|v: &f64| index_label(&tab.x_labels, *v))
            .y_label_formatter(&|v: &f64| index_label(&tab.y_labels, *v))
            .draw()
            .map_err(render_err)?;

        let cells = tab.counts.iter().enumerate().flat_map(|(yi, row)| {
            row.iter().enumerate().map(move |(xi, &count)| {
                let (x, y) = (xi as f64, yi as f64);
                let shade = count as f64 / max;
                Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    HSLColor(0.58, 0.65, 0.95 - 0.6 * shade).filled(),
                )
            })
        });
        ctx.draw_series(cells).map_err(render_err)?;
        Ok(())
    }
}
