//! Forecast series queries for dashboard consumers
//!
//! Reads the forecaster's `date,keller_forecast` CSV and returns parallel
//! label/value arrays, either for an optional inclusive date range or for a
//! single calendar day.

use crate::constants::{
    FORECAST_TIME_COLUMN, FORECAST_TIME_FORMATS, FORECAST_VALUE_COLUMN, SERIES_FULL_LABEL,
    SERIES_TIME_LABEL,
};
use crate::error::{Result, TideError};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Parallel arrays ready for charting
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_forecast_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    FORECAST_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Load forecast points in file order
///
/// Rows with an unparseable timestamp or a null value are skipped.
pub fn load_forecast(path: &Path) -> Result<Vec<ForecastPoint>> {
    if !path.exists() {
        return Err(TideError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .select([
            col(FORECAST_TIME_COLUMN).cast(DataType::String),
            col(FORECAST_VALUE_COLUMN).cast(DataType::Float64),
        ])
        .collect()?;

    let times = frame
        .column(FORECAST_TIME_COLUMN)?
        .as_materialized_series()
        .str()?;
    let values = frame
        .column(FORECAST_VALUE_COLUMN)?
        .as_materialized_series()
        .f64()?;

    let mut points = Vec::with_capacity(frame.height());
    let mut skipped = 0usize;
    for (time, value) in times.into_iter().zip(values.into_iter()) {
        match (time.and_then(parse_forecast_time), value) {
            (Some(timestamp), Some(value)) => points.push(ForecastPoint { timestamp, value }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} unusable forecast rows in {}", skipped, path.display());
    }
    info!("Loaded {} forecast points from {}", points.len(), path.display());
    Ok(points)
}

fn to_series<'a>(points: impl Iterator<Item = &'a ForecastPoint>, label: &str) -> ForecastSeries {
    let mut series = ForecastSeries::default();
    for point in points {
        series.timestamps.push(point.timestamp.format(label).to_string());
        series.values.push(point.value);
    }
    series
}

/// Points whose date lies within `[start, end]`; each bound is optional
pub fn series_in_range(
    points: &[ForecastPoint],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ForecastSeries {
    let selected = points.iter().filter(|p| {
        let date = p.timestamp.date();
        start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
    });
    to_series(selected, SERIES_FULL_LABEL)
}

/// Points on a single calendar day, labelled by time of day
pub fn series_for_day(points: &[ForecastPoint], day: NaiveDate) -> ForecastSeries {
    let selected = points.iter().filter(|p| p.timestamp.date() == day);
    to_series(selected, SERIES_TIME_LABEL)
}
