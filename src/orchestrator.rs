//! End-to-end pipeline orchestration
//!
//! Runs the registered stages in fixed order, each isolated through the
//! [`StageRunner`], then classifies every stage by whether its expected
//! artifacts exist on disk. That classification alone decides the overall
//! run status; stage outcomes that disagree with it are reported as
//! divergent. The orchestrator itself never fails.

use crate::aggregate::stage_daily_aggregates;
use crate::config::PipelineConfig;
use crate::constants::FINAL_SUMMARY_NAME;
use crate::error::{Result, TideError};
use crate::models::{ArtifactCheck, RunStatus, RunSummary, StageKind, StageOutcome};
use crate::runner::StageRunner;
use crate::stages::{expected_artifacts, StageRegistry};
use chrono::Local;
use glob::Pattern;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct Orchestrator {
    config: PipelineConfig,
    registry: StageRegistry,
    runner: StageRunner,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, registry: StageRegistry) -> Self {
        let runner = StageRunner::new(config.reports_path());
        Self {
            config,
            registry,
            runner,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage, classify artifacts and write the final summary
    pub fn run(&self) -> RunSummary {
        let start = Instant::now();
        info!("=== Starting tide sensor pipeline ===");
        info!("Working directory: {}", self.config.working_dir.display());

        if let Err(e) = self.config.ensure_directories() {
            error!("Could not prepare output directories: {}", e);
        }

        let mut outcomes = Vec::with_capacity(StageKind::ALL.len());
        for kind in StageKind::ALL {
            info!("--- Stage: {} ---", kind);
            self.clear_artifacts(kind);
            let outcome = self.runner.run(kind.name(), || self.run_stage(kind));
            outcomes.push((kind, outcome));
        }

        let artifact_checks: Vec<ArtifactCheck> = StageKind::ALL
            .iter()
            .map(|kind| self.check_artifacts(*kind))
            .collect();

        let mut summary = RunSummary {
            outcomes,
            artifact_checks,
            elapsed: start.elapsed(),
            final_report: None,
        };

        for kind in summary.divergent_stages() {
            let reported = summary
                .outcome(kind)
                .map(|o| o.status().to_string())
                .unwrap_or_default();
            warn!(
                "Stage {} reported {} but artifact check says {}",
                kind,
                reported,
                artifact_label(summary.artifacts_ok(kind))
            );
        }

        let detail = render_final_summary(&summary);
        summary.final_report = self.runner.write_report_logged(
            FINAL_SUMMARY_NAME,
            &summary.status().to_string(),
            &detail,
            Local::now(),
        );

        match summary.status() {
            RunStatus::Completed => info!(
                "Pipeline COMPLETED in {:.2}s",
                summary.elapsed.as_secs_f64()
            ),
            RunStatus::WithErrors => warn!(
                "Pipeline completed WITH ERRORS in {:.2}s",
                summary.elapsed.as_secs_f64()
            ),
        }

        summary
    }

    fn run_stage(&self, kind: StageKind) -> Result<String> {
        match kind {
            StageKind::QualityControl => self.stage_raw_input()?,
            StageKind::Forecasting => self.prepare_forecast_input()?,
            StageKind::BasicSensorAnalysis => {}
        }

        let stage = self.registry.get(kind).ok_or_else(|| TideError::Precondition {
            stage: kind.name().to_string(),
            reason: "no implementation registered".to_string(),
        })?;
        stage.run(&self.config)
    }

    /// Copy the raw file into the working directory when it is not there yet
    fn stage_raw_input(&self) -> Result<()> {
        let input = self.config.input_path();
        if input.is_file() {
            debug!("Raw input already staged at {}", input.display());
            return Ok(());
        }

        let fallback = self.config.fallback_input_path();
        if !fallback.is_file() {
            return Err(TideError::Precondition {
                stage: StageKind::QualityControl.name().to_string(),
                reason: format!(
                    "raw file not found at {} or {}",
                    input.display(),
                    fallback.display()
                ),
            });
        }

        fs::copy(&fallback, &input)?;
        info!("Staged raw input from {} to {}", fallback.display(), input.display());
        Ok(())
    }

    fn prepare_forecast_input(&self) -> Result<()> {
        let daily_file = self.config.daily_file_path();
        stage_daily_aggregates(&self.config.input_path(), &daily_file).map_err(|e| {
            TideError::Precondition {
                stage: StageKind::Forecasting.name().to_string(),
                reason: format!("daily aggregation failed: {}", e),
            }
        })?;
        Ok(())
    }

    /// Remove artifacts left by earlier runs so only this run's output counts
    fn clear_artifacts(&self, kind: StageKind) {
        for expected in expected_artifacts(kind, &self.config) {
            for stale in matching_files(&expected) {
                match fs::remove_file(&stale) {
                    Ok(()) => debug!("Removed stale artifact {}", stale.display()),
                    Err(e) => warn!("Could not remove stale artifact {}: {}", stale.display(), e),
                }
            }
        }
    }

    fn check_artifacts(&self, kind: StageKind) -> ArtifactCheck {
        let found: Vec<PathBuf> = expected_artifacts(kind, &self.config)
            .iter()
            .flat_map(|expected| matching_files(expected))
            .collect();

        debug!("Artifacts for {}: {:?}", kind, found);
        ArtifactCheck {
            stage: kind,
            ok: !found.is_empty(),
            found,
        }
    }
}

/// Existing files matching an expected artifact path; the file name may be a glob
fn matching_files(expected: &Path) -> Vec<PathBuf> {
    let (Some(dir), Some(name)) = (expected.parent(), expected.file_name()) else {
        return Vec::new();
    };
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        name.to_string_lossy()
    );

    match glob::glob(&pattern) {
        Ok(paths) => paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            warn!("Invalid artifact pattern {}: {}", pattern, e);
            Vec::new()
        }
    }
}

fn artifact_label(ok: bool) -> &'static str {
    if ok { "OK" } else { "ERROR" }
}

fn outcome_line(outcome: Option<&StageOutcome>) -> String {
    match outcome {
        Some(outcome) => match outcome.report_path() {
            Some(path) => format!("{} (report: {})", outcome.status(), path.display()),
            None => outcome.status().to_string(),
        },
        None => "not run".to_string(),
    }
}

fn render_final_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Stage results (artifact check):");
    for kind in StageKind::ALL {
        let _ = writeln!(out, "  {}: {}", kind, artifact_label(summary.artifacts_ok(kind)));
    }

    let _ = writeln!(out, "\nStage outcomes:");
    for kind in StageKind::ALL {
        let _ = writeln!(out, "  {}: {}", kind, outcome_line(summary.outcome(kind)));
    }

    let divergent = summary.divergent_stages();
    if divergent.is_empty() {
        let _ = writeln!(out, "\nDivergent stages: none");
    } else {
        let names: Vec<&str> = divergent.iter().map(|k| k.name()).collect();
        let _ = writeln!(out, "\nDivergent stages: {}", names.join(", "));
    }

    let _ = writeln!(out, "Elapsed time: {}", format_elapsed(summary.elapsed));
    out
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2} seconds", elapsed.as_secs_f64())
}
