//! Shewhart control limits and per-channel descriptive statistics

use super::stats;
use crate::constants::CONTROL_SIGMA;
use crate::error::{Result, TideError};
use crate::models::{Channel, ChannelSummary, ControlLimits, SensorTable};
use tracing::debug;

/// Mean ± 3σ over the non-missing values of a channel
///
/// A single reading has no spread, so its limits collapse onto the mean.
///
/// # Errors
///
/// `NoValidData` when every reading of the channel is missing.
pub fn control_limits(table: &SensorTable, channel: Channel) -> Result<ControlLimits> {
    let values = table.values(channel);
    let mean = stats::mean(&values).ok_or_else(|| TideError::NoValidData {
        channel: channel.to_string(),
    })?;
    let std = stats::sample_std(&values).unwrap_or(0.0);

    let limits = ControlLimits {
        channel,
        count: values.len(),
        mean,
        std,
        ucl: mean + CONTROL_SIGMA * std,
        lcl: mean - CONTROL_SIGMA * std,
    };

    debug!(
        "{} control limits: LCL={:.3} mean={:.3} UCL={:.3}",
        channel, limits.lcl, limits.mean, limits.ucl
    );

    Ok(limits)
}

pub fn channel_summary(table: &SensorTable, channel: Channel) -> ChannelSummary {
    let values = table.values(channel);
    ChannelSummary {
        channel,
        count: values.len(),
        mean: stats::mean(&values),
        std: stats::sample_std(&values),
        min: stats::min(&values),
        max: stats::max(&values),
    }
}

pub fn channel_summaries(table: &SensorTable) -> Vec<ChannelSummary> {
    Channel::ALL
        .iter()
        .map(|channel| channel_summary(table, *channel))
        .collect()
}
