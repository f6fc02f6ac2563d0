//! Configuration management and validation.
//!
//! Every stage receives the same explicit `PipelineConfig` instead of
//! relying on hardcoded relative paths. Relative directories are resolved
//! against the working directory; the orchestrator creates them before
//! dispatching any stage.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DAILY_FILE_NAME, FALLBACK_DIR_NAME, FORECAST_SERIES_FILE,
    LOG_FILE_NAME, PROCESSED_DIR_NAME, RAW_FILE_NAME, REPORTS_DIR_NAME, RESULTS_DIR_NAME,
};
use crate::error::{Result, TideError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// External forecasting executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecasterConfig {
    /// Program to run; receives the daily aggregate path as its last argument
    pub program: PathBuf,

    /// Arguments placed before the daily aggregate path
    #[serde(default)]
    pub args: Vec<String>,
}

/// Global configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the run operates in
    pub working_dir: PathBuf,

    /// Raw sensor file name staged inside the working directory
    pub raw_file_name: String,

    /// Directory searched for the raw file when it is not staged yet
    pub fallback_dir: PathBuf,

    /// Stage artifacts
    pub results_dir: PathBuf,

    /// Per-stage and final reports
    pub reports_dir: PathBuf,

    /// Daily aggregates for the forecaster
    pub processed_dir: PathBuf,

    /// Run log file
    pub log_file: PathBuf,

    /// Forecasting collaborator, if any
    pub forecaster: Option<ForecasterConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            raw_file_name: RAW_FILE_NAME.to_string(),
            fallback_dir: PathBuf::from(FALLBACK_DIR_NAME),
            results_dir: PathBuf::from(RESULTS_DIR_NAME),
            reports_dir: PathBuf::from(REPORTS_DIR_NAME),
            processed_dir: PathBuf::from(PROCESSED_DIR_NAME),
            log_file: PathBuf::from(LOG_FILE_NAME),
            forecaster: None,
        }
    }
}

impl PipelineConfig {
    /// Create configuration rooted at a working directory
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| TideError::Configuration {
            message: format!("{}: {}", path.display(), e),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// `<user config dir>/tidewatch/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    pub fn with_raw_file_name(mut self, name: impl Into<String>) -> Self {
        self.raw_file_name = name.into();
        self
    }

    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn with_forecaster(mut self, forecaster: ForecasterConfig) -> Self {
        self.forecaster = Some(forecaster);
        self
    }

    /// Check settings that would otherwise only fail mid-run
    pub fn validate(&self) -> Result<()> {
        if self.raw_file_name.trim().is_empty() {
            return Err(TideError::Configuration {
                message: "raw_file_name must not be empty".to_string(),
            });
        }
        if Path::new(&self.raw_file_name).components().count() != 1 {
            return Err(TideError::Configuration {
                message: format!("raw_file_name must be a bare file name, got {}", self.raw_file_name),
            });
        }
        if let Some(forecaster) = &self.forecaster {
            if forecaster.program.as_os_str().is_empty() {
                return Err(TideError::Configuration {
                    message: "forecaster program must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Staged raw file inside the working directory
    pub fn input_path(&self) -> PathBuf {
        self.working_dir.join(&self.raw_file_name)
    }

    pub fn fallback_input_path(&self) -> PathBuf {
        self.resolve(&self.fallback_dir).join(&self.raw_file_name)
    }

    pub fn results_path(&self) -> PathBuf {
        self.resolve(&self.results_dir)
    }

    pub fn reports_path(&self) -> PathBuf {
        self.resolve(&self.reports_dir)
    }

    pub fn processed_path(&self) -> PathBuf {
        self.resolve(&self.processed_dir)
    }

    pub fn daily_file_path(&self) -> PathBuf {
        self.processed_path().join(DAILY_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_file)
    }

    pub fn forecast_series_path(&self) -> PathBuf {
        self.results_path().join(FORECAST_SERIES_FILE)
    }

    /// Create the output directories every stage writes into
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.results_path(), self.reports_path(), self.processed_path()] {
            fs::create_dir_all(&dir)?;
            debug!("Ensured directory {}", dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_resolve_against_working_dir() {
        let config = PipelineConfig::new("/srv/tide");

        assert_eq!(config.input_path(), PathBuf::from("/srv/tide/valpoall.txt"));
        assert_eq!(
            config.fallback_input_path(),
            PathBuf::from("/srv/tide/data/valpoall.txt")
        );
        assert_eq!(
            config.daily_file_path(),
            PathBuf::from("/srv/tide/processed/daily_means.csv")
        );
    }

    #[test]
    fn test_absolute_directories_are_kept() {
        let config = PipelineConfig::new("/srv/tide").with_fallback_dir("/mnt/archive");
        assert_eq!(
            config.fallback_input_path(),
            PathBuf::from("/mnt/archive/valpoall.txt")
        );
    }

    #[test]
    fn test_from_file_uses_defaults_for_missing_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
working_dir = "/data/valparaiso"
raw_file_name = "sensors.txt"

[forecaster]
program = "/usr/local/bin/forecast"
args = ["--horizon", "7"]
"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.raw_file_name, "sensors.txt");
        assert_eq!(config.results_dir, PathBuf::from("results"));
        let forecaster = config.forecaster.unwrap();
        assert_eq!(forecaster.args, vec!["--horizon", "7"]);
    }

    #[test]
    fn test_validate_rejects_nested_raw_file_name() {
        let config = PipelineConfig::default().with_raw_file_name("data/valpoall.txt");
        assert!(matches!(
            config.validate(),
            Err(TideError::Configuration { .. })
        ));
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_forecaster_program() {
        let config = PipelineConfig::default()
            .with_working_dir("/srv/tide")
            .with_forecaster(ForecasterConfig {
                program: PathBuf::new(),
                args: Vec::new(),
            });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensure_directories_creates_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(temp_dir.path());

        config.ensure_directories().unwrap();

        assert!(config.results_path().is_dir());
        assert!(config.reports_path().is_dir());
        assert!(config.processed_path().is_dir());
    }
}
