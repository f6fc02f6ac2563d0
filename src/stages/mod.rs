//! Analysis stages and their static registry
//!
//! Each stage is a `Stage` implementation resolved through `StageRegistry`
//! by its `StageKind`. Stages receive the run configuration explicitly and
//! return a textual summary; any error they return becomes an ERROR outcome
//! in the stage runner.
//!
//! - [`basic`] - basic sensor analysis (statistics, combined series, correlation matrix)
//! - [`quality`] - quality control (census, outliers, inter-sensor error, regression, control limits)
//! - [`forecast`] - forecasting through an external collaborator

pub mod basic;
pub mod forecast;
pub mod quality;

pub use basic::BasicSensorAnalysis;
pub use forecast::{CommandForecaster, Forecaster, ForecastingStage, UnconfiguredForecaster};
pub use quality::{QualityAnalysis, QualityControl};

use crate::config::PipelineConfig;
use crate::constants::{basic_artifacts, quality_artifacts, FORECAST_ARTIFACT_PATTERN};
use crate::error::Result;
use crate::models::StageKind;
use std::fmt;
use std::path::PathBuf;

/// One independently executed analysis routine
pub trait Stage {
    /// Run the stage and return its textual summary
    fn run(&self, config: &PipelineConfig) -> Result<String>;
}

impl<F> Stage for F
where
    F: Fn(&PipelineConfig) -> Result<String>,
{
    fn run(&self, config: &PipelineConfig) -> Result<String> {
        self(config)
    }
}

/// Stage implementations keyed by kind, fixed at construction
pub struct StageRegistry {
    stages: Vec<(StageKind, Box<dyn Stage>)>,
}

impl StageRegistry {
    /// Registry with no stages; unregistered kinds fail when dispatched
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// The built-in stages with the given forecasting collaborator
    pub fn standard(forecaster: Box<dyn Forecaster>) -> Self {
        Self::empty()
            .with_stage(StageKind::BasicSensorAnalysis, Box::new(BasicSensorAnalysis))
            .with_stage(StageKind::QualityControl, Box::new(QualityControl))
            .with_stage(
                StageKind::Forecasting,
                Box::new(ForecastingStage::new(forecaster)),
            )
    }

    /// Built-in stages with the forecaster described by the configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        let forecaster: Box<dyn Forecaster> = match &config.forecaster {
            Some(forecaster) => Box::new(CommandForecaster::from_config(forecaster, config)),
            None => Box::new(UnconfiguredForecaster),
        };
        Self::standard(forecaster)
    }

    /// Register or replace the implementation for a stage kind
    pub fn with_stage(mut self, kind: StageKind, stage: Box<dyn Stage>) -> Self {
        self.stages.retain(|(k, _)| *k != kind);
        self.stages.push((kind, stage));
        self
    }

    pub fn get(&self, kind: StageKind) -> Option<&dyn Stage> {
        self.stages
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, stage)| stage.as_ref())
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|(kind, _)| kind))
            .finish()
    }
}

/// Files whose existence marks a stage as having produced output
///
/// Forecast artifacts are a glob pattern; the others are literal paths.
pub fn expected_artifacts(kind: StageKind, config: &PipelineConfig) -> Vec<PathBuf> {
    let results = config.results_path();
    match kind {
        StageKind::BasicSensorAnalysis => vec![
            results.join(basic_artifacts::SENSOR_STATISTICS),
            results.join(basic_artifacts::COMBINED_SERIES),
            results.join(basic_artifacts::CORRELATION_MATRIX),
        ],
        StageKind::QualityControl => vec![
            results.join(quality_artifacts::REPORT),
            results.join(quality_artifacts::DIFFERENCE_SERIES),
            results.join(quality_artifacts::CORRELATION_SCATTER),
            results.join(quality_artifacts::CONTROL_LIMITS),
        ],
        StageKind::Forecasting => vec![results.join(FORECAST_ARTIFACT_PATTERN)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TideError;

    #[test]
    fn test_with_stage_replaces_existing_kind() {
        let registry = StageRegistry::standard(Box::new(UnconfiguredForecaster)).with_stage(
            StageKind::QualityControl,
            Box::new(|_: &PipelineConfig| -> Result<String> { Ok("replaced".to_string()) }),
        );

        let config = PipelineConfig::default();
        let stage = registry.get(StageKind::QualityControl).unwrap();
        assert_eq!(stage.run(&config).unwrap(), "replaced");
        assert!(registry.get(StageKind::Forecasting).is_some());
    }

    #[test]
    fn test_empty_registry_has_no_stages() {
        let registry = StageRegistry::empty();
        for kind in StageKind::ALL {
            assert!(registry.get(kind).is_none());
        }
    }

    #[test]
    fn test_closure_stage_propagates_errors() {
        let stage = |_: &PipelineConfig| -> Result<String> {
            Err(TideError::Forecast {
                reason: "model offline".to_string(),
            })
        };
        assert!(stage.run(&PipelineConfig::default()).is_err());
    }

    #[test]
    fn test_expected_artifacts_live_in_results_dir() {
        let config = PipelineConfig::new("/srv/tide");
        for kind in StageKind::ALL {
            let artifacts = expected_artifacts(kind, &config);
            assert!(!artifacts.is_empty());
            assert!(artifacts.iter().all(|p| p.starts_with("/srv/tide/results")));
        }
    }
}
