//! Inter-sensor error between the two tide gauges
//!
//! Works on `keller - vega` over rows where both sensors report. With no
//! such rows every statistic stays undefined and RMSE is not computed.

use super::stats;
use crate::models::{Channel, SensorErrorStats, SensorTable};
use tracing::{debug, warn};

/// Paired differences `keller - vega` with their record index
pub fn sensor_differences(table: &SensorTable) -> Vec<(usize, f64)> {
    table
        .paired(Channel::Keller, Channel::Vega)
        .into_iter()
        .map(|(idx, keller, vega)| (idx, keller - vega))
        .collect()
}

pub fn sensor_error_stats(table: &SensorTable) -> SensorErrorStats {
    let differences: Vec<f64> = sensor_differences(table)
        .into_iter()
        .map(|(_, d)| d)
        .collect();

    if differences.is_empty() {
        warn!("No rows with both keller and vega readings; error statistics undefined");
        return SensorErrorStats::default();
    }

    let result = SensorErrorStats {
        paired_count: differences.len(),
        mean: stats::mean(&differences),
        std: stats::sample_std(&differences),
        min: stats::min(&differences),
        max: stats::max(&differences),
        rmse: stats::rmse(&differences),
    };

    debug!(
        "Inter-sensor error over {} pairs: rmse={:?}",
        result.paired_count, result.rmse
    );

    result
}
