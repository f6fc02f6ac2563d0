//! Tests for the quality analyzers
//!
//! Shared table builders used by the per-analyzer test modules.

pub mod correlation_tests;

use crate::models::{Channel, ChannelValues, SensorRecord, SensorTable};
use chrono::{NaiveDate, NaiveDateTime};

/// Hourly timestamp on 2023-01-01 plus `hours`
pub fn hourly(hours: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2023, 1, 1 + hours / 24)?.and_hms_opt(hours % 24, 0, 0)
}

/// Build a table from (keller, vega) pairs with every other channel present
pub fn create_tide_table(pairs: &[(Option<f64>, Option<f64>)]) -> SensorTable {
    let records = pairs
        .iter()
        .enumerate()
        .map(|(i, (keller, vega))| {
            SensorRecord::new(
                hourly(i as u32),
                ChannelValues {
                    keller: *keller,
                    vega: *vega,
                    air_temp: Some(18.0 + i as f64 * 0.1),
                    pressure: Some(1013.0),
                    humidity: Some(75.0 + (i % 3) as f64),
                    water_temp: Some(14.0),
                },
            )
        })
        .collect();
    SensorTable::new(records)
}

/// Build a table where only one channel carries the given values
pub fn create_channel_table(channel: Channel, values: &[Option<f64>]) -> SensorTable {
    let records = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let mut channel_values = ChannelValues::default();
            channel_values.set(channel, *value);
            SensorRecord::new(hourly(i as u32), channel_values)
        })
        .collect();
    SensorTable::new(records)
}

/// Identical sensors following a smooth tide curve
pub fn create_identical_sensor_table() -> SensorTable {
    let pairs: Vec<_> = (0..48)
        .map(|i| {
            let level = 1.0 + 0.8 * (i as f64 * std::f64::consts::PI / 6.2).sin();
            (Some(level), Some(level))
        })
        .collect();
    create_tide_table(&pairs)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
