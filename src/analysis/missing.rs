//! Missing-data census
//!
//! Counts missing timestamps and missing channel readings over the full
//! table. Percentages always use the full table length as denominator; an
//! empty table reports 0%.

use crate::models::{Channel, MissingCount, MissingDataCensus, SensorTable};
use tracing::debug;

pub fn missing_data_census(table: &SensorTable) -> MissingDataCensus {
    let total_rows = table.len();

    let channels = Channel::ALL
        .iter()
        .map(|channel| {
            let missing = table
                .records()
                .iter()
                .filter(|r| r.value(*channel).is_none())
                .count();
            (*channel, missing_count(missing, total_rows))
        })
        .collect();

    let census = MissingDataCensus {
        total_rows,
        timestamp: missing_count(table.missing_timestamps(), total_rows),
        channels,
    };

    debug!(
        "Missing-data census over {} rows: {} missing timestamps",
        total_rows, census.timestamp.missing
    );

    census
}

fn missing_count(missing: usize, total_rows: usize) -> MissingCount {
    let percentage = if total_rows == 0 {
        0.0
    } else {
        missing as f64 / total_rows as f64 * 100.0
    };
    MissingCount {
        missing,
        percentage,
    }
}
