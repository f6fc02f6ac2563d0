//! Application constants for tidewatch
//!
//! File layout conventions, raw format constants, statistical factors and
//! the artifact names each stage is expected to leave behind.

// =============================================================================
// File Layout
// =============================================================================

/// Raw sensor file name inside the working directory
pub const RAW_FILE_NAME: &str = "valpoall.txt";

/// Directory (relative to the working directory) holding the fallback raw file
pub const FALLBACK_DIR_NAME: &str = "data";

/// Stage artifacts (chart data, tables, text reports)
pub const RESULTS_DIR_NAME: &str = "results";

/// Per-stage and final run reports
pub const REPORTS_DIR_NAME: &str = "reports";

/// Daily aggregates staged for the forecaster
pub const PROCESSED_DIR_NAME: &str = "processed";

/// Daily aggregate file name inside the processed directory
pub const DAILY_FILE_NAME: &str = "daily_means.csv";

/// Run log file name inside the working directory
pub const LOG_FILE_NAME: &str = "pipeline.log";

/// Default configuration file name under the user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the user config directory
pub const APP_DIR_NAME: &str = "tidewatch";

// =============================================================================
// Raw Format
// =============================================================================

/// Positional fields per raw row: year, month, day, hour and six channels
pub const RAW_FIELD_COUNT: usize = 10;

/// Leading date/time fields per raw row
pub const RAW_DATE_FIELDS: usize = 4;

// =============================================================================
// Statistics
// =============================================================================

/// Tukey fence multiplier applied to the interquartile range
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Control chart width in standard deviations
pub const CONTROL_SIGMA: f64 = 3.0;

/// Minimum paired points for a correlation/regression fit
pub const MIN_REGRESSION_POINTS: usize = 2;

/// Outlier values echoed per channel in the text report
pub const OUTLIER_PREVIEW_COUNT: usize = 5;

// =============================================================================
// Reports
// =============================================================================

/// Timestamp embedded in report file names (millisecond resolution)
pub const REPORT_FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S_%3f";

/// Timestamp printed inside report headers
pub const REPORT_HEADER_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Stage name used for the consolidated run report
pub const FINAL_SUMMARY_NAME: &str = "final_summary";

// =============================================================================
// Stage Artifacts
// =============================================================================

/// Artifacts written by the basic sensor analysis stage
pub mod basic_artifacts {
    pub const SENSOR_STATISTICS: &str = "sensor_statistics.csv";
    pub const COMBINED_SERIES: &str = "sensors_combined.csv";
    pub const CORRELATION_MATRIX: &str = "correlation_matrix.csv";
}

/// Artifacts written by the quality control stage
pub mod quality_artifacts {
    pub const REPORT: &str = "quality_control.txt";
    pub const DIFFERENCE_SERIES: &str = "inter_sensor_difference.csv";
    pub const CORRELATION_SCATTER: &str = "sensor_correlation.csv";
    pub const CONTROL_LIMITS: &str = "control_limits.csv";
}

/// Forecast artifacts are matched by pattern since the forecaster decides
/// which channels it produces
pub const FORECAST_ARTIFACT_PATTERN: &str = "forecast_*.csv";

/// Environment variable telling the forecaster where to write its artifacts
pub const FORECAST_RESULTS_ENV: &str = "TIDEWATCH_RESULTS_DIR";

// =============================================================================
// Forecast Series
// =============================================================================

/// Forecast file consumed by the dashboard series query
pub const FORECAST_SERIES_FILE: &str = "forecast_keller_future.csv";

/// Timestamp column of the forecast file
pub const FORECAST_TIME_COLUMN: &str = "date";

/// Value column of the forecast file
pub const FORECAST_VALUE_COLUMN: &str = "keller_forecast";

/// Accepted timestamp layouts in the forecast file
pub const FORECAST_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Label format for range queries
pub const SERIES_FULL_LABEL: &str = "%Y-%m-%d %H:%M:%S";

/// Label format for the single-day query
pub const SERIES_TIME_LABEL: &str = "%H:%M";
