//! Statistical quality analysis of sensor tables
//!
//! Every analyzer is a pure function of a `SensorTable`: it reads the table
//! and returns a result record, so the same table can be reused across
//! stages and tests without interference.
//!
//! - [`missing`] - missing-value census per channel and for timestamps
//! - [`outliers`] - IQR fences and flagged records per channel
//! - [`inter_sensor`] - keller/vega difference statistics and RMSE
//! - [`correlation`] - Pearson r, OLS fit and the channel correlation matrix
//! - [`control`] - ±3σ control limits and descriptive statistics
//! - [`stats`] - numeric helpers

pub mod control;
pub mod correlation;
pub mod inter_sensor;
pub mod missing;
pub mod outliers;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use control::{channel_summaries, channel_summary, control_limits};
pub use correlation::{correlate_sensors, correlation_matrix};
pub use inter_sensor::{sensor_differences, sensor_error_stats};
pub use missing::missing_data_census;
pub use outliers::{detect_all_outliers, detect_outliers};
