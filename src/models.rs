//! Core data structures for tide-gauge quality control.
//!
//! Defines sensor channels, the typed sensor table produced by the loader,
//! analyzer result records, and the stage outcome / run summary types
//! exchanged between the stage runner and the orchestrator.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Measurement channels in raw-file column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Keller,
    Vega,
    AirTemp,
    Pressure,
    Humidity,
    WaterTemp,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Keller,
        Channel::Vega,
        Channel::AirTemp,
        Channel::Pressure,
        Channel::Humidity,
        Channel::WaterTemp,
    ];

    /// The two redundant tide-height sensors
    pub const TIDE_SENSORS: [Channel; 2] = [Channel::Keller, Channel::Vega];

    /// Column name used in every CSV artifact
    pub fn column_name(&self) -> &'static str {
        match self {
            Channel::Keller => "keller",
            Channel::Vega => "vega",
            Channel::AirTemp => "air_temp",
            Channel::Pressure => "pressure",
            Channel::Humidity => "humidity",
            Channel::WaterTemp => "water_temp",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Keller | Channel::Vega => "m",
            Channel::AirTemp | Channel::WaterTemp => "°C",
            Channel::Pressure => "mbar",
            Channel::Humidity => "%",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One optional value per channel; `None` is a missing reading, never zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelValues {
    pub keller: Option<f64>,
    pub vega: Option<f64>,
    pub air_temp: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub water_temp: Option<f64>,
}

impl ChannelValues {
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Keller => self.keller,
            Channel::Vega => self.vega,
            Channel::AirTemp => self.air_temp,
            Channel::Pressure => self.pressure,
            Channel::Humidity => self.humidity,
            Channel::WaterTemp => self.water_temp,
        }
    }

    pub fn set(&mut self, channel: Channel, value: Option<f64>) {
        let slot = match channel {
            Channel::Keller => &mut self.keller,
            Channel::Vega => &mut self.vega,
            Channel::AirTemp => &mut self.air_temp,
            Channel::Pressure => &mut self.pressure,
            Channel::Humidity => &mut self.humidity,
            Channel::WaterTemp => &mut self.water_temp,
        };
        *slot = value;
    }
}

/// A single raw observation
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    /// `None` when year/month/day/hour do not form a valid date
    pub timestamp: Option<NaiveDateTime>,
    pub values: ChannelValues,
}

impl SensorRecord {
    pub fn new(timestamp: Option<NaiveDateTime>, values: ChannelValues) -> Self {
        Self { timestamp, values }
    }

    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.values.get(channel)
    }
}

/// Ordered sensor records, one per raw data line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTable {
    records: Vec<SensorRecord>,
}

impl SensorTable {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-missing values of a channel, in table order
    pub fn values(&self, channel: Channel) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.value(channel)).collect()
    }

    /// Non-missing values of a channel with their record index
    pub fn indexed_values(&self, channel: Channel) -> Vec<(usize, f64)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.value(channel).map(|v| (idx, v)))
            .collect()
    }

    /// Rows where both channels are present, as (index, a, b)
    pub fn paired(&self, a: Channel, b: Channel) -> Vec<(usize, f64, f64)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| match (r.value(a), r.value(b)) {
                (Some(x), Some(y)) => Some((idx, x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn missing_timestamps(&self) -> usize {
        self.records.iter().filter(|r| r.timestamp.is_none()).count()
    }
}

/// Missing-value count for one column of the table
#[derive(Debug, Clone, PartialEq)]
pub struct MissingCount {
    pub missing: usize,
    pub percentage: f64,
}

/// Missing-data census over the full table
#[derive(Debug, Clone, PartialEq)]
pub struct MissingDataCensus {
    pub total_rows: usize,
    pub timestamp: MissingCount,
    pub channels: Vec<(Channel, MissingCount)>,
}

impl MissingDataCensus {
    pub fn channel(&self, channel: Channel) -> Option<&MissingCount> {
        self.channels
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, count)| count)
    }
}

/// IQR fences and flagged records for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub channel: Channel,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Record indices into the analysed table
    pub outlier_indices: Vec<usize>,
}

impl OutlierReport {
    pub fn outlier_count(&self) -> usize {
        self.outlier_indices.len()
    }
}

/// Statistics of `keller - vega` over paired rows; `None` means undefined
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorErrorStats {
    pub paired_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub rmse: Option<f64>,
}

/// Pearson correlation and OLS fit of vega on keller
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub paired_count: usize,
    pub r: f64,
    pub r_squared: f64,
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope
    pub std_err: f64,
    pub intercept_std_err: f64,
}

/// Shewhart ±3σ limits for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLimits {
    pub channel: Channel,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub ucl: f64,
    pub lcl: f64,
}

/// Descriptive statistics for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub channel: Channel,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Pairwise-complete Pearson correlations between all channels
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub channels: Vec<Channel>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Channel, b: Channel) -> Option<f64> {
        let i = self.channels.iter().position(|c| *c == a)?;
        let j = self.channels.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

/// Channel means for one calendar date
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub values: ChannelValues,
}

/// The three independently executed analysis stages, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    BasicSensorAnalysis,
    QualityControl,
    Forecasting,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [
        StageKind::BasicSensorAnalysis,
        StageKind::QualityControl,
        StageKind::Forecasting,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::BasicSensorAnalysis => "basic_sensor_analysis",
            StageKind::QualityControl => "quality_control",
            StageKind::Forecasting => "forecasting",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Success,
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Success => f.write_str("SUCCESS"),
            StageStatus::Error => f.write_str("ERROR"),
        }
    }
}

/// Result of one stage invocation, fixed once the runner returns it
#[derive(Debug, Clone)]
pub struct StageOutcome {
    stage_name: String,
    status: StageStatus,
    detail: String,
    report_path: Option<PathBuf>,
    timestamp: DateTime<Local>,
}

impl StageOutcome {
    pub fn new(
        stage_name: impl Into<String>,
        status: StageStatus,
        detail: impl Into<String>,
        report_path: Option<PathBuf>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            status,
            detail: detail.into(),
            report_path,
            timestamp,
        }
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// `None` when the report file could not be written
    pub fn report_path(&self) -> Option<&PathBuf> {
        self.report_path.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Success
    }
}

/// Artifact-existence classification of one stage
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactCheck {
    pub stage: StageKind,
    pub ok: bool,
    pub found: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    WithErrors,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("COMPLETED"),
            RunStatus::WithErrors => f.write_str("WITH ERRORS"),
        }
    }
}

/// Consolidated result of one orchestrator invocation
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcomes: Vec<(StageKind, StageOutcome)>,
    pub artifact_checks: Vec<ArtifactCheck>,
    pub elapsed: Duration,
    pub final_report: Option<PathBuf>,
}

impl RunSummary {
    /// Overall status derived from artifact checks only
    pub fn status(&self) -> RunStatus {
        if !self.artifact_checks.is_empty() && self.artifact_checks.iter().all(|c| c.ok) {
            RunStatus::Completed
        } else {
            RunStatus::WithErrors
        }
    }

    pub fn outcome(&self, stage: StageKind) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|(kind, _)| *kind == stage)
            .map(|(_, outcome)| outcome)
    }

    pub fn artifacts_ok(&self, stage: StageKind) -> bool {
        self.artifact_checks
            .iter()
            .any(|c| c.stage == stage && c.ok)
    }

    /// Stages whose reported status disagrees with their artifact check
    pub fn divergent_stages(&self) -> Vec<StageKind> {
        self.outcomes
            .iter()
            .filter(|(kind, outcome)| outcome.is_success() != self.artifacts_ok(*kind))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_values_roundtrip_by_channel() {
        let mut values = ChannelValues::default();
        for (i, channel) in Channel::ALL.iter().enumerate() {
            values.set(*channel, Some(i as f64));
        }
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(values.get(*channel), Some(i as f64));
        }
    }

    #[test]
    fn test_table_paired_skips_missing() {
        let table = SensorTable::new(vec![
            SensorRecord::new(None, ChannelValues { keller: Some(1.0), vega: Some(1.1), ..Default::default() }),
            SensorRecord::new(None, ChannelValues { keller: Some(2.0), ..Default::default() }),
            SensorRecord::new(None, ChannelValues { keller: Some(3.0), vega: Some(3.1), ..Default::default() }),
        ]);

        let pairs = table.paired(Channel::Keller, Channel::Vega);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0, 2);
        assert_eq!(table.values(Channel::Vega), vec![1.1, 3.1]);
        assert_eq!(table.missing_timestamps(), 3);
    }

    #[test]
    fn test_run_summary_status_and_divergence() {
        let now = Local::now();
        let summary = RunSummary {
            outcomes: vec![
                (
                    StageKind::BasicSensorAnalysis,
                    StageOutcome::new("basic_sensor_analysis", StageStatus::Success, "", None, now),
                ),
                (
                    StageKind::QualityControl,
                    StageOutcome::new("quality_control", StageStatus::Success, "", None, now),
                ),
            ],
            artifact_checks: vec![
                ArtifactCheck { stage: StageKind::BasicSensorAnalysis, ok: true, found: vec![] },
                ArtifactCheck { stage: StageKind::QualityControl, ok: false, found: vec![] },
            ],
            elapsed: Duration::from_millis(5),
            final_report: None,
        };

        assert_eq!(summary.status(), RunStatus::WithErrors);
        assert_eq!(summary.divergent_stages(), vec![StageKind::QualityControl]);
    }

    #[test]
    fn test_stage_names_are_ordered() {
        let names: Vec<_> = StageKind::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["basic_sensor_analysis", "quality_control", "forecasting"]
        );
    }
}
