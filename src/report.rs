//! Rendering of analysis results.
//!
//! Text renderers produce the human-readable sections that go into stage
//! details and reports. Frame builders produce the chart-data tables (the
//! series a plotting tool draws) that stages persist as CSV artifacts.

use crate::analysis::sensor_differences;
use crate::constants::OUTLIER_PREVIEW_COUNT;
use crate::error::Result;
use crate::models::{
    Channel, ChannelSummary, ControlLimits, CorrelationMatrix, CorrelationResult,
    MissingDataCensus, OutlierReport, SensorErrorStats, SensorTable,
};
use polars::prelude::*;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write a frame as CSV with a header row, creating parent directories
pub fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)?;
    debug!("Wrote {} rows to {}", frame.height(), path.display());
    Ok(())
}

fn fmt_opt(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*} {}", decimals, v, unit).trim_end().to_string(),
        None => "undefined".to_string(),
    }
}

// =============================================================================
// Text Sections
// =============================================================================

pub fn render_missing_census(census: &MissingDataCensus) -> String {
    let mut out = String::from("=== MISSING DATA ANALYSIS ===\n");
    let _ = writeln!(out, "Rows analysed: {}", census.total_rows);

    let mut any_missing = false;
    if census.timestamp.missing > 0 {
        any_missing = true;
        let _ = writeln!(
            out,
            "timestamp: {} missing ({:.2}%)",
            census.timestamp.missing, census.timestamp.percentage
        );
    }
    for (channel, count) in &census.channels {
        if count.missing > 0 {
            any_missing = true;
            let _ = writeln!(
                out,
                "{}: {} missing ({:.2}%)",
                channel, count.missing, count.percentage
            );
        }
    }
    if !any_missing {
        out.push_str("No missing values\n");
    }
    out
}

pub fn render_outliers(
    reports: &[OutlierReport],
    skipped: &[Channel],
    table: &SensorTable,
) -> String {
    let mut out = String::from("=== OUTLIER ANALYSIS (IQR) ===\n");
    for report in reports {
        let _ = writeln!(out, "\n{}:", report.channel.column_name().to_uppercase());
        let _ = writeln!(
            out,
            "Normal range: [{:.2}, {:.2}]",
            report.lower_bound, report.upper_bound
        );
        let _ = writeln!(out, "Outliers: {}", report.outlier_count());

        if !report.outlier_indices.is_empty() {
            let preview: Vec<String> = report
                .outlier_indices
                .iter()
                .take(OUTLIER_PREVIEW_COUNT)
                .filter_map(|idx| {
                    let record = table.records().get(*idx)?;
                    let value = record.value(report.channel)?;
                    Some(format!("  row {}: {:.3}", idx, value))
                })
                .collect();
            let _ = writeln!(out, "First {} outliers:", preview.len());
            for line in preview {
                let _ = writeln!(out, "{}", line);
            }
        }
    }
    for channel in skipped {
        let _ = writeln!(out, "\n{}: no valid data", channel.column_name().to_uppercase());
    }
    out
}

pub fn render_error_stats(stats: &SensorErrorStats) -> String {
    let mut out = String::from("=== INTER-SENSOR ERROR (KELLER - VEGA) ===\n");
    let _ = writeln!(out, "Paired readings: {}", stats.paired_count);
    let _ = writeln!(out, "Mean: {}", fmt_opt(stats.mean, 3, "m"));
    let _ = writeln!(out, "Standard deviation: {}", fmt_opt(stats.std, 3, "m"));
    let _ = writeln!(out, "Maximum: {}", fmt_opt(stats.max, 3, "m"));
    let _ = writeln!(out, "Minimum: {}", fmt_opt(stats.min, 3, "m"));
    let _ = writeln!(out, "RMSE: {}", fmt_opt(stats.rmse, 3, "m"));
    out
}

pub fn render_correlation(result: &CorrelationResult) -> String {
    let mut out = String::from("=== SENSOR CORRELATION ===\n");
    let _ = writeln!(out, "Paired readings: {}", result.paired_count);
    let _ = writeln!(out, "Correlation coefficient (r): {:.4}", result.r);
    let _ = writeln!(out, "Coefficient of determination (R²): {:.4}", result.r_squared);
    let _ = writeln!(out, "Regression slope: {:.4}", result.slope);
    let _ = writeln!(out, "Intercept: {:.4}", result.intercept);
    let _ = writeln!(out, "Standard error: {:.4}", result.std_err);
    let _ = writeln!(out, "Intercept standard error: {:.4}", result.intercept_std_err);
    out
}

pub fn render_control_limits(limits: &[ControlLimits]) -> String {
    let mut out = String::from("=== CONTROL LIMITS (±3σ) ===\n");
    for l in limits {
        let unit = l.channel.unit();
        let _ = writeln!(out, "\nControl statistics - {}:", l.channel);
        let _ = writeln!(out, "Mean: {:.3} {}", l.mean, unit);
        let _ = writeln!(out, "Standard deviation: {:.3} {}", l.std, unit);
        let _ = writeln!(out, "Upper control limit (UCL): {:.3} {}", l.ucl, unit);
        let _ = writeln!(out, "Lower control limit (LCL): {:.3} {}", l.lcl, unit);
    }
    out
}

pub fn render_channel_summaries(summaries: &[ChannelSummary]) -> String {
    let mut out = String::from("=== SENSOR STATISTICS ===\n");
    for s in summaries {
        let unit = s.channel.unit();
        let _ = writeln!(
            out,
            "{:<11} n={:<7} mean={} std={} min={} max={}",
            s.channel.column_name(),
            s.count,
            fmt_opt(s.mean, 3, unit),
            fmt_opt(s.std, 3, unit),
            fmt_opt(s.min, 3, unit),
            fmt_opt(s.max, 3, unit),
        );
    }
    out
}

// =============================================================================
// Chart Data Frames
// =============================================================================

fn timestamp_labels(table: &SensorTable, indices: impl Iterator<Item = usize>) -> Vec<Option<String>> {
    indices
        .map(|idx| {
            table
                .records()
                .get(idx)
                .and_then(|r| r.timestamp)
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        })
        .collect()
}

pub fn summary_frame(summaries: &[ChannelSummary]) -> Result<DataFrame> {
    let frame = DataFrame::new(vec![
        Column::new(
            "channel".into(),
            summaries
                .iter()
                .map(|s| s.channel.column_name().to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "count".into(),
            summaries.iter().map(|s| s.count as u64).collect::<Vec<_>>(),
        ),
        Column::new("mean".into(), summaries.iter().map(|s| s.mean).collect::<Vec<_>>()),
        Column::new("std".into(), summaries.iter().map(|s| s.std).collect::<Vec<_>>()),
        Column::new("min".into(), summaries.iter().map(|s| s.min).collect::<Vec<_>>()),
        Column::new("max".into(), summaries.iter().map(|s| s.max).collect::<Vec<_>>()),
    ])?;
    Ok(frame)
}

/// Every channel against time, the data behind the combined sensor chart
pub fn combined_series_frame(table: &SensorTable) -> Result<DataFrame> {
    let mut columns = vec![Column::new(
        "timestamp".into(),
        timestamp_labels(table, 0..table.len()),
    )];
    for channel in Channel::ALL {
        let values: Vec<Option<f64>> = table.records().iter().map(|r| r.value(channel)).collect();
        columns.push(Column::new(channel.column_name().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

pub fn correlation_matrix_frame(matrix: &CorrelationMatrix) -> Result<DataFrame> {
    let mut columns = vec![Column::new(
        "channel".into(),
        matrix
            .channels
            .iter()
            .map(|c| c.column_name().to_string())
            .collect::<Vec<_>>(),
    )];
    for (j, channel) in matrix.channels.iter().enumerate() {
        let values: Vec<Option<f64>> = matrix.values.iter().map(|row| row[j]).collect();
        columns.push(Column::new(channel.column_name().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Paired keller/vega readings and their difference over time
pub fn difference_series_frame(table: &SensorTable) -> Result<DataFrame> {
    let pairs = table.paired(Channel::Keller, Channel::Vega);
    let differences = sensor_differences(table);

    let frame = DataFrame::new(vec![
        Column::new(
            "timestamp".into(),
            timestamp_labels(table, pairs.iter().map(|(idx, _, _)| *idx)),
        ),
        Column::new("keller".into(), pairs.iter().map(|(_, k, _)| *k).collect::<Vec<_>>()),
        Column::new("vega".into(), pairs.iter().map(|(_, _, v)| *v).collect::<Vec<_>>()),
        Column::new(
            "difference".into(),
            differences.iter().map(|(_, d)| *d).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(frame)
}

/// Scatter points of vega against keller with the fitted regression line
pub fn correlation_scatter_frame(
    table: &SensorTable,
    result: &CorrelationResult,
) -> Result<DataFrame> {
    let pairs = table.paired(Channel::Keller, Channel::Vega);
    let frame = DataFrame::new(vec![
        Column::new("keller".into(), pairs.iter().map(|(_, k, _)| *k).collect::<Vec<_>>()),
        Column::new("vega".into(), pairs.iter().map(|(_, _, v)| *v).collect::<Vec<_>>()),
        Column::new(
            "fitted".into(),
            pairs
                .iter()
                .map(|(_, k, _)| result.slope * k + result.intercept)
                .collect::<Vec<_>>(),
        ),
    ])?;
    Ok(frame)
}

pub fn control_limits_frame(limits: &[ControlLimits]) -> Result<DataFrame> {
    let frame = DataFrame::new(vec![
        Column::new(
            "channel".into(),
            limits
                .iter()
                .map(|l| l.channel.column_name().to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new("count".into(), limits.iter().map(|l| l.count as u64).collect::<Vec<_>>()),
        Column::new("mean".into(), limits.iter().map(|l| l.mean).collect::<Vec<_>>()),
        Column::new("std".into(), limits.iter().map(|l| l.std).collect::<Vec<_>>()),
        Column::new("ucl".into(), limits.iter().map(|l| l.ucl).collect::<Vec<_>>()),
        Column::new("lcl".into(), limits.iter().map(|l| l.lcl).collect::<Vec<_>>()),
    ])?;
    Ok(frame)
}
