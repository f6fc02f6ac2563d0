//! Error handling for tide-gauge quality control and stage orchestration.
//!
//! Provides error types with context for raw file loading, statistical
//! analysis preconditions, artifact writing and the forecasting collaborator.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TideError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Raw data file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Failed to load {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Invalid column count in {path} at line {line}: expected {expected} fields, found {found}")]
    ColumnCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Insufficient data for {operation}: need at least {required} paired points, found {found}")]
    InsufficientData {
        operation: String,
        required: usize,
        found: usize,
    },

    #[error("No valid data for channel {channel}")]
    NoValidData { channel: String },

    #[error("Degenerate series in {operation}: {reason}")]
    DegenerateSeries { operation: String, reason: String },

    #[error("Forecasting failed: {reason}")]
    Forecast { reason: String },

    #[error("Stage precondition failed for {stage}: {reason}")]
    Precondition { stage: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, TideError>;
