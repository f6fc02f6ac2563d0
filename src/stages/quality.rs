//! Quality control stage
//!
//! Runs the full analyzer suite over the staged raw file. All analyses run
//! before anything is written, so insufficient or degenerate tide data fails
//! the stage without leaving partial artifacts behind.

use super::Stage;
use crate::analysis::{
    control_limits, correlate_sensors, detect_all_outliers, missing_data_census,
    sensor_error_stats,
};
use crate::config::PipelineConfig;
use crate::constants::quality_artifacts;
use crate::error::Result;
use crate::loader::load_sensor_table;
use crate::models::{
    Channel, ControlLimits, CorrelationResult, MissingDataCensus, OutlierReport,
    SensorErrorStats, SensorTable,
};
use crate::report::{
    control_limits_frame, correlation_scatter_frame, difference_series_frame,
    render_control_limits, render_correlation, render_error_stats, render_missing_census,
    render_outliers, write_csv,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Every quality check computed over one sensor table
#[derive(Debug, Clone)]
pub struct QualityAnalysis {
    pub census: MissingDataCensus,
    pub outliers: Vec<OutlierReport>,
    /// Channels without a single valid reading
    pub skipped: Vec<Channel>,
    pub error_stats: SensorErrorStats,
    pub correlation: CorrelationResult,
    /// Limits for the tide sensors only
    pub limits: Vec<ControlLimits>,
}

impl QualityAnalysis {
    pub fn analyse(table: &SensorTable) -> Result<Self> {
        let census = missing_data_census(table);
        let (outliers, skipped) = detect_all_outliers(table);
        let error_stats = sensor_error_stats(table);
        let correlation = correlate_sensors(table)?;
        let limits = Channel::TIDE_SENSORS
            .iter()
            .map(|channel| control_limits(table, *channel))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            census,
            outliers,
            skipped,
            error_stats,
            correlation,
            limits,
        })
    }

    pub fn total_outliers(&self) -> usize {
        self.outliers.iter().map(|r| r.outlier_count()).sum()
    }

    /// The consolidated text report
    pub fn render(&self, table: &SensorTable) -> String {
        [
            render_missing_census(&self.census),
            render_outliers(&self.outliers, &self.skipped, table),
            render_error_stats(&self.error_stats),
            render_correlation(&self.correlation),
            render_control_limits(&self.limits),
        ]
        .join("\n")
    }

    /// Write the text report and chart-data files into `results`
    pub fn write_artifacts(&self, table: &SensorTable, results: &Path) -> Result<()> {
        write_csv(
            &mut difference_series_frame(table)?,
            &results.join(quality_artifacts::DIFFERENCE_SERIES),
        )?;
        write_csv(
            &mut correlation_scatter_frame(table, &self.correlation)?,
            &results.join(quality_artifacts::CORRELATION_SCATTER),
        )?;
        write_csv(
            &mut control_limits_frame(&self.limits)?,
            &results.join(quality_artifacts::CONTROL_LIMITS),
        )?;
        fs::write(results.join(quality_artifacts::REPORT), self.render(table))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QualityControl;

impl Stage for QualityControl {
    fn run(&self, config: &PipelineConfig) -> Result<String> {
        let input = config.input_path();
        let mut details = vec![format!("Loading data from {}...", input.display())];

        let table = load_sensor_table(&input)?;
        let analysis = QualityAnalysis::analyse(&table)?;
        analysis.write_artifacts(&table, &config.results_path())?;

        info!(
            "Quality control finished: {} records, {} outliers, r={:.4}",
            table.len(),
            analysis.total_outliers(),
            analysis.correlation.r
        );

        details.push(format!(
            "Analysed {} records ({} without timestamp)",
            analysis.census.total_rows, analysis.census.timestamp.missing
        ));
        details.push(format!("Outliers flagged: {}", analysis.total_outliers()));
        details.push(format!(
            "Inter-sensor RMSE: {}",
            analysis
                .error_stats
                .rmse
                .map(|v| format!("{:.3} m", v))
                .unwrap_or_else(|| "undefined".to_string())
        ));
        details.push(format!(
            "Keller/Vega correlation: r={:.4}, R²={:.4}",
            analysis.correlation.r, analysis.correlation.r_squared
        ));
        details.push("\nAnalysis completed. Generated files:".to_string());
        for name in [
            quality_artifacts::REPORT,
            quality_artifacts::DIFFERENCE_SERIES,
            quality_artifacts::CORRELATION_SCATTER,
            quality_artifacts::CONTROL_LIMITS,
        ] {
            details.push(format!("- {}", name));
        }

        Ok(details.join("\n"))
    }
}
