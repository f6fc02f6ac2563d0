//! Basic sensor analysis stage
//!
//! Produces the overview of every channel: the combined time series, the
//! descriptive statistics table and the channel correlation matrix.

use super::Stage;
use crate::analysis::{channel_summaries, correlation_matrix};
use crate::config::PipelineConfig;
use crate::constants::basic_artifacts;
use crate::error::Result;
use crate::loader::load_sensor_table;
use crate::report::{
    combined_series_frame, correlation_matrix_frame, render_channel_summaries, summary_frame,
    write_csv,
};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSensorAnalysis;

impl Stage for BasicSensorAnalysis {
    fn run(&self, config: &PipelineConfig) -> Result<String> {
        let mut details = vec!["Loading sensor data...".to_string()];
        let input = config.input_path();
        let table = load_sensor_table(&input)?;
        details.push(format!("Loaded {} records from {}", table.len(), input.display()));

        let results = config.results_path();

        details.push("Step 1: Writing combined sensor series...".to_string());
        let combined_path = results.join(basic_artifacts::COMBINED_SERIES);
        write_csv(&mut combined_series_frame(&table)?, &combined_path)?;

        details.push("Step 2: Computing sensor statistics...".to_string());
        let summaries = channel_summaries(&table);
        write_csv(
            &mut summary_frame(&summaries)?,
            &results.join(basic_artifacts::SENSOR_STATISTICS),
        )?;
        details.push(render_channel_summaries(&summaries));

        details.push("Step 3: Computing correlation matrix...".to_string());
        let matrix = correlation_matrix(&table);
        write_csv(
            &mut correlation_matrix_frame(&matrix)?,
            &results.join(basic_artifacts::CORRELATION_MATRIX),
        )?;

        info!("Basic sensor analysis wrote artifacts to {}", results.display());
        details.push("Analysis completed successfully".to_string());
        Ok(details.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TideError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_basic_analysis_writes_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(temp_dir.path());
        fs::write(
            config.input_path(),
            "2023 1 1 0 1.0 1.1 18.0 1013.0 80.0 14.0\n\
             2023 1 1 1 1.2 1.25 18.3 1012.5 79.0 14.1\n\
             2023 1 1 2 1.4 1.38 18.9 1012.1 77.0 14.3\n",
        )
        .unwrap();

        let details = BasicSensorAnalysis.run(&config).unwrap();

        assert!(details.contains("Loaded 3 records"));
        let results = config.results_path();
        assert!(results.join(basic_artifacts::SENSOR_STATISTICS).exists());
        assert!(results.join(basic_artifacts::COMBINED_SERIES).exists());
        assert!(results.join(basic_artifacts::CORRELATION_MATRIX).exists());
    }

    #[test]
    fn test_basic_analysis_fails_without_input() {
        let temp_dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(temp_dir.path());

        let result = BasicSensorAnalysis.run(&config);
        assert!(matches!(result, Err(TideError::InputNotFound { .. })));
    }
}
