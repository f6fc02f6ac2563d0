//! Daily resampling of sensor tables.
//!
//! Groups records by the calendar date of their timestamp and averages each
//! channel over that date's valid readings. Records without a timestamp are
//! left out rather than assigned to a fallback date, and a date with no valid
//! reading for a channel keeps a null mean instead of zero.

use crate::error::{Result, TideError};
use crate::loader::load_sensor_table;
use crate::models::{Channel, ChannelValues, DailyAggregate, SensorTable};
use crate::report::write_csv;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

const DATE_COLUMN: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily channel means as a frame with columns `date, keller, ..., water_temp`
pub fn daily_frame(table: &SensorTable) -> Result<DataFrame> {
    let dated: Vec<_> = table
        .records()
        .iter()
        .filter_map(|r| r.timestamp.map(|ts| (ts.date(), r.values)))
        .collect();

    let excluded = table.len() - dated.len();
    if excluded > 0 {
        debug!("Excluding {} records without timestamp from daily means", excluded);
    }

    let dates: Vec<String> = dated
        .iter()
        .map(|(date, _)| date.format(DATE_FORMAT).to_string())
        .collect();

    let mut columns = vec![Column::new(DATE_COLUMN.into(), dates)];
    for channel in Channel::ALL {
        let values: Vec<Option<f64>> = dated.iter().map(|(_, v)| v.get(channel)).collect();
        columns.push(Column::new(channel.column_name().into(), values));
    }

    let means: Vec<Expr> = Channel::ALL
        .iter()
        .map(|channel| col(channel.column_name()).mean())
        .collect();

    let daily = DataFrame::new(columns)?
        .lazy()
        .group_by([col(DATE_COLUMN)])
        .agg(means)
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    Ok(daily)
}

/// Convert a daily frame back into typed aggregates
pub fn frame_to_aggregates(frame: &DataFrame) -> Result<Vec<DailyAggregate>> {
    let dates = frame.column(DATE_COLUMN)?.as_materialized_series().str()?.clone();

    let mut channel_columns = Vec::with_capacity(Channel::ALL.len());
    for channel in Channel::ALL {
        let series = frame
            .column(channel.column_name())?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        channel_columns.push((channel, series.f64()?.clone()));
    }

    let mut aggregates = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let raw_date = dates.get(idx).ok_or_else(|| TideError::LoadFailed {
            path: DATE_COLUMN.into(),
            reason: format!("null date in daily aggregate row {}", idx),
        })?;
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            TideError::LoadFailed {
                path: DATE_COLUMN.into(),
                reason: format!("bad date {}: {}", raw_date, e),
            }
        })?;

        let mut values = ChannelValues::default();
        for (channel, column) in &channel_columns {
            values.set(*channel, column.get(idx));
        }
        aggregates.push(DailyAggregate { date, values });
    }

    Ok(aggregates)
}

/// Daily aggregates sorted by date ascending
pub fn aggregate_daily(table: &SensorTable) -> Result<Vec<DailyAggregate>> {
    frame_to_aggregates(&daily_frame(table)?)
}

/// Load a raw file, aggregate it and persist the daily CSV for the forecaster
pub fn stage_daily_aggregates(input: &Path, output: &Path) -> Result<usize> {
    let table = load_sensor_table(input)?;
    let mut frame = daily_frame(&table)?;
    write_csv(&mut frame, output)?;

    info!(
        "Daily aggregates written to {} ({} days from {} records)",
        output.display(),
        frame.height(),
        table.len()
    );

    Ok(frame.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorRecord;
    use chrono::NaiveDateTime;
    use std::fs;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2023, 5, day)?.and_hms_opt(hour, 0, 0)
    }

    fn record(timestamp: Option<NaiveDateTime>, keller: Option<f64>, vega: Option<f64>) -> SensorRecord {
        SensorRecord::new(
            timestamp,
            ChannelValues {
                keller,
                vega,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_daily_means_sorted_by_date() {
        let table = SensorTable::new(vec![
            record(at(3, 0), Some(2.0), Some(2.0)),
            record(at(1, 0), Some(1.0), Some(1.5)),
            record(at(1, 6), Some(3.0), Some(2.5)),
            record(at(3, 12), Some(4.0), None),
        ]);

        let daily = aggregate_daily(&table).unwrap();

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(daily[0].values.keller, Some(2.0));
        assert_eq!(daily[0].values.vega, Some(2.0));
        assert_eq!(daily[1].values.keller, Some(3.0));
        // missing readings are excluded from the mean, not counted as zero
        assert_eq!(daily[1].values.vega, Some(2.0));
    }

    #[test]
    fn test_channel_without_readings_is_missing_not_zero() {
        let table = SensorTable::new(vec![
            record(at(2, 0), Some(1.0), None),
            record(at(2, 1), Some(1.2), None),
        ]);

        let daily = aggregate_daily(&table).unwrap();

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].values.vega, None);
        assert_eq!(daily[0].values.air_temp, None);
    }

    #[test]
    fn test_records_without_timestamp_are_excluded() {
        let table = SensorTable::new(vec![
            record(None, Some(100.0), Some(100.0)),
            record(at(4, 0), Some(1.0), Some(1.0)),
        ]);

        let daily = aggregate_daily(&table).unwrap();

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].values.keller, Some(1.0));
    }

    #[test]
    fn test_empty_table_yields_no_days() {
        let daily = aggregate_daily(&SensorTable::default()).unwrap();
        assert!(daily.is_empty());
    }

    #[test]
    fn test_stage_daily_aggregates_writes_csv() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("valpoall.txt");
        fs::write(
            &input,
            "2023 5 1 0 1.0 1.1 15.0 1012.0 70.0 13.0\n\
             2023 5 1 1 1.2 1.3 15.2 1012.2 72.0 13.2\n\
             2023 5 2 0 0.8 NaN 14.0 1011.0 68.0 12.9\n",
        )
        .unwrap();
        let output = temp_dir.path().join("processed").join("daily_means.csv");

        let days = stage_daily_aggregates(&input, &output).unwrap();

        assert_eq!(days, 2);
        let contents = fs::read_to_string(&output).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,keller,vega,air_temp,pressure,humidity,water_temp"
        );
        assert!(lines.next().unwrap().starts_with("2023-05-01,"));
        assert!(lines.next().unwrap().starts_with("2023-05-02,"));
    }
}
