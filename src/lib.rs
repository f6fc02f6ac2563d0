//! Tidewatch Library
//!
//! Quality control and orchestration for a pair of co-located tide gauge
//! sensors (Keller and Vega) recorded alongside air temperature, pressure,
//! humidity and water temperature.
//!
//! This library provides tools for:
//! - Loading the whitespace-delimited raw sensor file with row-level recovery
//! - Missing data census, IQR outlier detection and inter-sensor error statistics
//! - Keller/Vega regression and ±3σ control limits
//! - Daily channel means for the forecasting collaborator
//! - Running isolated analysis stages with timestamped reports
//! - Classifying a run by the artifacts each stage left behind

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod stages;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{ForecasterConfig, PipelineConfig};
pub use error::{Result, TideError};
pub use models::{Channel, RunStatus, RunSummary, SensorTable, StageKind, StageOutcome};
pub use orchestrator::Orchestrator;
pub use runner::StageRunner;
pub use stages::{Forecaster, Stage, StageRegistry};
