//! IQR outlier detection
//!
//! Fences are `Q1 - 1.5 IQR` and `Q3 + 1.5 IQR` over the non-missing values
//! of a channel. A constant channel has IQR 0, so both fences equal the
//! constant and any differing reading is flagged.

use super::stats::quantile;
use crate::constants::IQR_FENCE_FACTOR;
use crate::error::{Result, TideError};
use crate::models::{Channel, OutlierReport, SensorTable};
use tracing::{debug, warn};

/// Detect outliers in one channel
///
/// # Errors
///
/// `NoValidData` when every reading of the channel is missing.
pub fn detect_outliers(table: &SensorTable, channel: Channel) -> Result<OutlierReport> {
    let indexed = table.indexed_values(channel);
    let values: Vec<f64> = indexed.iter().map(|(_, v)| *v).collect();

    let (q1, q3) = match (quantile(&values, 0.25), quantile(&values, 0.75)) {
        (Some(q1), Some(q3)) => (q1, q3),
        _ => {
            return Err(TideError::NoValidData {
                channel: channel.to_string(),
            });
        }
    };

    let iqr = q3 - q1;
    let lower_bound = q1 - IQR_FENCE_FACTOR * iqr;
    let upper_bound = q3 + IQR_FENCE_FACTOR * iqr;

    let outlier_indices: Vec<usize> = indexed
        .iter()
        .filter(|(_, v)| *v < lower_bound || *v > upper_bound)
        .map(|(idx, _)| *idx)
        .collect();

    debug!(
        "{}: fences [{:.3}, {:.3}], {} outliers",
        channel,
        lower_bound,
        upper_bound,
        outlier_indices.len()
    );

    Ok(OutlierReport {
        channel,
        q1,
        q3,
        iqr,
        lower_bound,
        upper_bound,
        outlier_indices,
    })
}

/// Detect outliers in every channel that has data
///
/// Channels with no valid readings are skipped and returned by name so the
/// caller can mention them in its report.
pub fn detect_all_outliers(table: &SensorTable) -> (Vec<OutlierReport>, Vec<Channel>) {
    let mut reports = Vec::new();
    let mut skipped = Vec::new();

    for channel in Channel::ALL {
        match detect_outliers(table, channel) {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!("Skipping outlier detection for {}: {}", channel, e);
                skipped.push(channel);
            }
        }
    }

    (reports, skipped)
}
