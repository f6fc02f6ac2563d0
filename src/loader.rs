//! Raw sensor file loading.
//!
//! Parses whitespace-delimited rows of `year month day hour` followed by the
//! six channel readings into a `SensorTable`. Problems confined to one row
//! (an impossible date, a non-numeric reading) are recovered as missing
//! values; only an unreadable file or a row with the wrong number of fields
//! fails the load.

use crate::constants::{RAW_DATE_FIELDS, RAW_FIELD_COUNT};
use crate::error::{Result, TideError};
use crate::models::{Channel, ChannelValues, SensorRecord, SensorTable};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Load a raw sensor file into a table with one record per data line
pub fn load_sensor_table(path: &Path) -> Result<SensorTable> {
    let file = File::open(path).map_err(|e| {
        error!("Cannot open raw data file {}: {}", path.display(), e);
        if e.kind() == std::io::ErrorKind::NotFound {
            TideError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TideError::LoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })?;

    parse_sensor_lines(BufReader::new(file), path)
}

/// Parse raw rows from any buffered reader; `source` is used for error context
pub fn parse_sensor_lines<R: BufRead>(reader: R, source: &Path) -> Result<SensorTable> {
    let mut records = Vec::new();
    let mut invalid_dates = 0usize;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TideError::LoadFailed {
            path: source.to_path_buf(),
            reason: format!("read error at line {}: {}", line_num + 1, e),
        })?;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != RAW_FIELD_COUNT {
            error!(
                "Rejecting {}: line {} has {} fields",
                source.display(),
                line_num + 1,
                fields.len()
            );
            return Err(TideError::ColumnCount {
                path: source.to_path_buf(),
                line: line_num + 1,
                expected: RAW_FIELD_COUNT,
                found: fields.len(),
            });
        }

        let record = parse_record(&fields);
        if record.timestamp.is_none() {
            invalid_dates += 1;
            debug!(
                "Invalid date at line {}: {}-{}-{} {}:00",
                line_num + 1,
                fields[0],
                fields[1],
                fields[2],
                fields[3]
            );
        }
        records.push(record);
    }

    if invalid_dates > 0 {
        warn!(
            "{} of {} records in {} have an invalid date and no timestamp",
            invalid_dates,
            records.len(),
            source.display()
        );
    }
    info!("Loaded {} records from {}", records.len(), source.display());

    Ok(SensorTable::new(records))
}

/// Build one record from exactly `RAW_FIELD_COUNT` fields
fn parse_record(fields: &[&str]) -> SensorRecord {
    let timestamp = parse_timestamp(&fields[..RAW_DATE_FIELDS]);

    let mut values = ChannelValues::default();
    for (channel, field) in Channel::ALL.iter().zip(&fields[RAW_DATE_FIELDS..]) {
        values.set(*channel, parse_reading(field));
    }

    SensorRecord::new(timestamp, values)
}

/// Cast a date field to an integer the way a float-to-int cast would
fn parse_date_part(field: &str) -> Option<i64> {
    let value: f64 = field.parse().ok()?;
    if value.is_finite() {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

fn parse_timestamp(fields: &[&str]) -> Option<NaiveDateTime> {
    let year = i32::try_from(parse_date_part(fields[0])?).ok()?;
    let month = u32::try_from(parse_date_part(fields[1])?).ok()?;
    let day = u32::try_from(parse_date_part(fields[2])?).ok()?;
    let hour = u32::try_from(parse_date_part(fields[3])?).ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

/// Non-numeric tokens, NaN and infinities are missing readings
fn parse_reading(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}
