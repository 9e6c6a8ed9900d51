//! PNG charts of the price series written next to the predictions.

use crate::domain::features::FeatureTable;
use anyhow::{Context, Result, anyhow, bail};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CLOSE_TREND_FILE: &str = "close_trend.png";
pub const RETURN_DISTRIBUTION_FILE: &str = "return_distribution.png";
pub const RETURN_BINS: usize = 30;

fn draw_error<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("Chart drawing failed: {}", e)
}

/// Defined `(row, value)` pairs of a table column.
fn defined_points(table: &FeatureTable, column: &str) -> Result<Vec<(usize, f64)>> {
    let values = table
        .column(column)
        .with_context(|| format!("Column {} is not in the feature table", column))?;
    let points: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    if points.is_empty() {
        bail!("Column {} has no defined values to plot", column);
    }
    Ok(points)
}

/// Range padded so a flat series still spans a drawable interval.
fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        let pad = (min.abs() * 0.01).max(1e-6);
        (min - pad, max + pad)
    }
}

/// Writes `close_trend.png`: the close series over the table's dates.
pub fn plot_close_trend(table: &FeatureTable, output_dir: &Path) -> Result<PathBuf> {
    let points = defined_points(table, "close")?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    let path = output_dir.join(CLOSE_TREND_FILE);

    let min = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = padded_range(min, max);

    draw_close_trend(&path, &points, table.dates(), low..high)?;
    info!("Wrote close trend chart to {:?}", path);
    Ok(path)
}

fn draw_close_trend(
    path: &Path,
    points: &[(usize, f64)],
    dates: &[chrono::NaiveDate],
    range: std::ops::Range<f64>,
) -> Result<()> {
    let root = BitMapBackend::new(path, (1500, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Gold Close Price Trend", ("sans-serif", 28).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0usize..dates.len().max(1), range)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Price")
        .x_labels(8)
        .x_label_formatter(&|i| dates.get(*i).map(|d| d.to_string()).unwrap_or_default())
        .draw()
        .map_err(draw_error)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(draw_error)?
        .label("Close")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .draw()
        .map_err(draw_error)?;
    root.present().map_err(draw_error)?;
    Ok(())
}

/// Counts of `values` in `bins` equal-width bins over their range. The last
/// bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = padded_range(min, max);
    let mut counts = vec![0usize; bins.max(1)];
    let width = (high - low) / counts.len() as f64;
    for &value in values {
        let bin = (((value - low) / width) as usize).min(counts.len() - 1);
        counts[bin] += 1;
    }
    (low, high, counts)
}

/// Writes `return_distribution.png`: a 30-bin histogram of daily returns.
pub fn plot_return_distribution(table: &FeatureTable, output_dir: &Path) -> Result<PathBuf> {
    let returns: Vec<f64> = defined_points(table, "return")?
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    let path = output_dir.join(RETURN_DISTRIBUTION_FILE);

    let (low, high, counts) = histogram(&returns, RETURN_BINS);
    draw_return_distribution(&path, low, high, &counts)?;
    info!("Wrote return distribution chart to {:?}", path);
    Ok(path)
}

fn draw_return_distribution(path: &Path, low: f64, high: f64, counts: &[usize]) -> Result<()> {
    let width = (high - low) / counts.len() as f64;
    let top = counts.iter().copied().max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Daily Return Distribution", ("sans-serif", 28).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(low..high, 0usize..top + top / 10 + 1)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc("Return")
        .y_desc("Frequency")
        .x_label_formatter(&|v| format!("{:.3}", v))
        .draw()
        .map_err(draw_error)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(bin, &count)| {
            let left = low + bin as f64 * width;
            Rectangle::new([(left, 0), (left + width, count)], BLUE.mix(0.6).filled())
        }))
        .map_err(draw_error)?;
    root.present().map_err(draw_error)?;
    Ok(())
}
