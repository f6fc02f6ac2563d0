//! Forecasting stage
//!
//! The forecasting model lives outside this crate. The stage hands the
//! daily aggregate file to a [`Forecaster`] and reports whatever summary it
//! returns; the orchestrator prepares the daily file beforehand.

use super::Stage;
use crate::config::{ForecasterConfig, PipelineConfig};
use crate::constants::FORECAST_RESULTS_ENV;
use crate::error::{Result, TideError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Produces forecast artifacts from a daily aggregate file
pub trait Forecaster {
    fn forecast(&self, daily_file: &Path) -> Result<String>;
}

/// Runs an external program, passing the daily file as its last argument
///
/// The program runs in the working directory with the results directory
/// exported in `TIDEWATCH_RESULTS_DIR`. Standard output becomes the stage
/// summary; a non-zero exit status fails the stage with standard error.
#[derive(Debug, Clone)]
pub struct CommandForecaster {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    results_dir: PathBuf,
}

impl CommandForecaster {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: PathBuf::from("."),
            results_dir: PathBuf::from("."),
        }
    }

    pub fn from_config(forecaster: &ForecasterConfig, config: &PipelineConfig) -> Self {
        Self::new(forecaster.program.clone(), forecaster.args.clone())
            .in_directories(config.working_dir.clone(), config.results_path())
    }

    pub fn in_directories(mut self, working_dir: PathBuf, results_dir: PathBuf) -> Self {
        self.working_dir = working_dir;
        self.results_dir = results_dir;
        self
    }
}

impl Forecaster for CommandForecaster {
    fn forecast(&self, daily_file: &Path) -> Result<String> {
        debug!(
            "Running forecaster {} {:?} {}",
            self.program.display(),
            self.args,
            daily_file.display()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(daily_file)
            .current_dir(&self.working_dir)
            .env(FORECAST_RESULTS_ENV, &self.results_dir)
            .output()
            .map_err(|e| TideError::Forecast {
                reason: format!("cannot start {}: {}", self.program.display(), e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.program.display(), output.status)
            } else {
                format!("{} exited with {}: {}", self.program.display(), output.status, stderr)
            };
            return Err(TideError::Forecast { reason });
        }

        if !stderr.is_empty() {
            warn!("Forecaster stderr: {}", stderr);
        }

        Ok(stdout)
    }
}

/// Stands in when no forecaster is configured; always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredForecaster;

impl Forecaster for UnconfiguredForecaster {
    fn forecast(&self, _daily_file: &Path) -> Result<String> {
        Err(TideError::Forecast {
            reason: "no forecaster configured".to_string(),
        })
    }
}

pub struct ForecastingStage {
    forecaster: Box<dyn Forecaster>,
}

impl ForecastingStage {
    pub fn new(forecaster: Box<dyn Forecaster>) -> Self {
        Self { forecaster }
    }
}

impl Stage for ForecastingStage {
    fn run(&self, config: &PipelineConfig) -> Result<String> {
        let daily_file = config.daily_file_path();
        if !daily_file.exists() {
            return Err(TideError::Precondition {
                stage: "forecasting".to_string(),
                reason: format!("daily aggregate file {} is missing", daily_file.display()),
            });
        }

        info!("Forecasting from {}", daily_file.display());
        let summary = self.forecaster.forecast(&daily_file)?;

        let mut details = format!("Forecast input: {}", daily_file.display());
        if !summary.is_empty() {
            details.push('\n');
            details.push_str(&summary);
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct RecordingForecaster {
        seen: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Forecaster for RecordingForecaster {
        fn forecast(&self, daily_file: &Path) -> Result<String> {
            self.seen.borrow_mut().push(daily_file.to_path_buf());
            Ok("7 day horizon".to_string())
        }
    }

    fn staged_config(temp_dir: &TempDir) -> PipelineConfig {
        let config = PipelineConfig::new(temp_dir.path());
        config.ensure_directories().unwrap();
        fs::write(config.daily_file_path(), "date,keller\n2023-05-01,1.0\n").unwrap();
        config
    }

    #[test]
    fn test_stage_passes_daily_file_to_forecaster() {
        let temp_dir = TempDir::new().unwrap();
        let config = staged_config(&temp_dir);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let stage = ForecastingStage::new(Box::new(RecordingForecaster { seen: seen.clone() }));

        let details = stage.run(&config).unwrap();

        assert!(details.contains("7 day horizon"));
        assert_eq!(*seen.borrow(), vec![config.daily_file_path()]);
    }

    #[test]
    fn test_stage_requires_daily_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(temp_dir.path());
        let stage = ForecastingStage::new(Box::new(UnconfiguredForecaster));

        let result = stage.run(&config);
        assert!(matches!(result, Err(TideError::Precondition { .. })));
    }

    #[test]
    fn test_unconfigured_forecaster_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = staged_config(&temp_dir);
        let stage = ForecastingStage::new(Box::new(UnconfiguredForecaster));

        let result = stage.run(&config);
        assert!(matches!(result, Err(TideError::Forecast { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_forecaster_writes_into_results_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = staged_config(&temp_dir);
        let forecaster = CommandForecaster::from_config(
            &ForecasterConfig {
                program: PathBuf::from("sh"),
                args: vec![
                    "-c".to_string(),
                    r#"cp "$1" "$TIDEWATCH_RESULTS_DIR/forecast_keller.csv" && echo forecast ready"#
                        .to_string(),
                    "forecaster".to_string(),
                ],
            },
            &config,
        );

        let summary = forecaster.forecast(&config.daily_file_path()).unwrap();

        assert_eq!(summary, "forecast ready");
        assert!(config.results_path().join("forecast_keller.csv").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_forecaster_reports_stderr_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let config = staged_config(&temp_dir);
        let forecaster = CommandForecaster::new(
            "sh",
            vec!["-c".to_string(), "echo model diverged >&2; exit 3".to_string()],
        )
        .in_directories(temp_dir.path().to_path_buf(), config.results_path());

        match forecaster.forecast(&config.daily_file_path()) {
            Err(TideError::Forecast { reason }) => assert!(reason.contains("model diverged")),
            other => panic!("expected forecast error, got {:?}", other),
        }
    }

    #[test]
    fn test_command_forecaster_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let forecaster = CommandForecaster::new(temp_dir.path().join("no-such-model"), Vec::new());

        let result = forecaster.forecast(&temp_dir.path().join("daily_means.csv"));
        assert!(matches!(result, Err(TideError::Forecast { .. })));
    }
}
