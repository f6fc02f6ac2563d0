//! Isolated stage execution with per-stage reports
//!
//! A stage runs inside `run`, which converts any error (or panic) into an
//! ERROR outcome and writes a timestamped report file. Report writing is
//! best-effort: a failed write is logged and the outcome keeps its status.

use crate::constants::{REPORT_FILE_TIMESTAMP, REPORT_HEADER_TIMESTAMP};
use crate::error::{Result, TideError};
use crate::models::{StageOutcome, StageStatus};
use chrono::{DateTime, Local};
use std::any::Any;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Collision suffixes tried before giving up on a report name
const MAX_REPORT_SUFFIX: u32 = 1000;

#[derive(Debug, Clone)]
pub struct StageRunner {
    reports_dir: PathBuf,
}

impl StageRunner {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Execute a stage body and record its outcome
    pub fn run<F>(&self, stage_name: &str, body: F) -> StageOutcome
    where
        F: FnOnce() -> Result<String>,
    {
        info!("Running stage {}", stage_name);

        let (status, detail) = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(summary)) => (StageStatus::Success, summary),
            Ok(Err(e)) => {
                error!("Stage {} failed: {}", stage_name, e);
                (StageStatus::Error, e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Stage {} panicked: {}", stage_name, message);
                (StageStatus::Error, format!("stage panicked: {}", message))
            }
        };

        let timestamp = Local::now();
        let report_path =
            self.write_report_logged(stage_name, &status.to_string(), &detail, timestamp);

        info!("Stage {} finished with status {}", stage_name, status);
        StageOutcome::new(stage_name, status, detail, report_path, timestamp)
    }

    /// Write a report, logging instead of returning failures
    pub fn write_report_logged(
        &self,
        name: &str,
        status_label: &str,
        detail: &str,
        timestamp: DateTime<Local>,
    ) -> Option<PathBuf> {
        match self.write_report(name, status_label, detail, timestamp) {
            Ok(path) => {
                info!("Report written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not write report for {}: {}", name, e);
                None
            }
        }
    }

    /// Write `report_<name>_<timestamp>.txt` without overwriting earlier reports
    pub fn write_report(
        &self,
        name: &str,
        status_label: &str,
        detail: &str,
        timestamp: DateTime<Local>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.reports_dir)?;

        let contents = format!(
            "=== {} REPORT ===\nTimestamp: {}\nStatus: {}\n\nDetails:\n{}\n",
            name.to_uppercase(),
            timestamp.format(REPORT_HEADER_TIMESTAMP),
            status_label,
            detail
        );

        let stem = format!("report_{}_{}", name, timestamp.format(REPORT_FILE_TIMESTAMP));
        for suffix in 0..MAX_REPORT_SUFFIX {
            let file_name = if suffix == 0 {
                format!("{}.txt", stem)
            } else {
                format!("{}_{}.txt", stem, suffix)
            };
            let path = self.reports_dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(TideError::Io(e)),
            }
        }

        Err(TideError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free report name for {} in {}", stem, self.reports_dir.display()),
        )))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_success_outcome_carries_summary() {
        let temp_dir = TempDir::new().unwrap();
        let runner = StageRunner::new(temp_dir.path().join("reports"));

        let outcome = runner.run("basic_sensor_analysis", || Ok("all good".to_string()));

        assert!(outcome.is_success());
        assert_eq!(outcome.detail(), "all good");
        let report = fs::read_to_string(outcome.report_path().unwrap()).unwrap();
        assert!(report.starts_with("=== BASIC_SENSOR_ANALYSIS REPORT ==="));
        assert!(report.contains("Status: SUCCESS"));
        assert!(report.contains("all good"));
    }

    #[test]
    fn test_error_outcome_carries_message() {
        let temp_dir = TempDir::new().unwrap();
        let runner = StageRunner::new(temp_dir.path());

        let outcome = runner.run("quality_control", || {
            Err(TideError::NoValidData {
                channel: "keller".to_string(),
            })
        });

        assert_eq!(outcome.status(), StageStatus::Error);
        assert!(outcome.detail().contains("keller"));
        let report = fs::read_to_string(outcome.report_path().unwrap()).unwrap();
        assert!(report.contains("Status: ERROR"));
    }

    #[test]
    fn test_panicking_stage_is_contained() {
        let temp_dir = TempDir::new().unwrap();
        let runner = StageRunner::new(temp_dir.path());

        let outcome = runner.run("forecasting", || panic!("model exploded"));

        assert_eq!(outcome.status(), StageStatus::Error);
        assert!(outcome.detail().contains("model exploded"));
    }

    #[test]
    fn test_reports_never_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let runner = StageRunner::new(temp_dir.path());
        let timestamp = Local::now();

        let first = runner
            .write_report("quality_control", "SUCCESS", "first", timestamp)
            .unwrap();
        let second = runner
            .write_report("quality_control", "SUCCESS", "second", timestamp)
            .unwrap();

        assert_ne!(first, second);
        assert!(fs::read_to_string(&first).unwrap().contains("first"));
        assert!(fs::read_to_string(&second).unwrap().contains("second"));
    }

    #[test]
    fn test_report_failure_keeps_status() {
        let temp_dir = TempDir::new().unwrap();
        // a file where the reports directory should be
        let blocked = temp_dir.path().join("reports");
        fs::write(&blocked, "not a directory").unwrap();
        let runner = StageRunner::new(&blocked);

        let outcome = runner.run("basic_sensor_analysis", || Ok("done".to_string()));

        assert!(outcome.is_success());
        assert!(outcome.report_path().is_none());
    }
}
