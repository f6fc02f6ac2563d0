//! Command implementations for the tidewatch CLI
//!
//! Loads layered configuration (defaults, config file, command-line
//! overrides), initialises logging and dispatches to the subcommand.

use crate::cli::args::{Args, Command, QcArgs, SeriesArgs};
use crate::config::{ForecasterConfig, PipelineConfig};
use crate::dashboard::{load_forecast, series_for_day, series_in_range};
use crate::loader::load_sensor_table;
use crate::models::{RunStatus, RunSummary, StageKind};
use crate::orchestrator::Orchestrator;
use crate::stages::{QualityAnalysis, StageRegistry};
use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Run the selected subcommand; returns whether it succeeded
pub fn run(args: Args) -> Result<bool> {
    let (config, config_file) = load_configuration(&args)?;

    let log_file = match args.command {
        Command::Run(_) => Some(config.log_path()),
        _ => None,
    };
    setup_logging(args.get_log_level(), log_file.as_deref());

    match &config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Command::Run(_) => run_pipeline(config),
        Command::Qc(qc_args) => run_quality_report(qc_args),
        Command::Series(series_args) => run_series(&config, series_args),
    }
}

/// Set up tracing to stderr and, for pipeline runs, an append-mode log file
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tidewatch={}", log_level)));

    let mut file_error = None;
    let file_layer = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => Some(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(e) => {
            file_error = Some(format!("{}: {:#}", path.display(), e));
            None
        }
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        if let Some(message) = file_error {
            warn!("Could not open log file {}", message);
        }
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Open the run log for appending, creating its directory first
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("cannot open log file")
}

/// Defaults, then the config file, then command-line overrides
fn load_configuration(args: &Args) -> Result<(PipelineConfig, Option<PathBuf>)> {
    let config_file = match &args.config_file {
        Some(path) => Some(path.clone()),
        None => PipelineConfig::default_config_path().filter(|path| path.exists()),
    };

    let mut config = match &config_file {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    apply_cli_overrides(&mut config, args);
    config.validate().context("Invalid configuration")?;

    Ok((config, config_file))
}

fn apply_cli_overrides(config: &mut PipelineConfig, args: &Args) {
    if let Some(work_dir) = &args.work_dir {
        config.working_dir = work_dir.clone();
    }

    if let Command::Run(run_args) = &args.command {
        if let Some(raw_file) = &run_args.raw_file {
            config.raw_file_name = raw_file.clone();
        }
        if let Some(fallback_dir) = &run_args.fallback_dir {
            config.fallback_dir = fallback_dir.clone();
        }
        if let Some(program) = &run_args.forecast_command {
            config.forecaster = Some(ForecasterConfig {
                program: program.clone(),
                args: run_args.forecast_args.clone(),
            });
        }
    }
}

fn run_pipeline(config: PipelineConfig) -> Result<bool> {
    if config.forecaster.is_none() {
        warn!("No forecaster configured; the forecasting stage will fail");
    }

    let registry = StageRegistry::from_config(&config);
    let summary = Orchestrator::new(config, registry).run();
    print_run_summary(&summary);

    Ok(summary.status() == RunStatus::Completed)
}

fn print_run_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Tide sensor pipeline".bright_white().bold());
    for kind in StageKind::ALL {
        let label = if summary.artifacts_ok(kind) {
            "OK".bright_green().bold()
        } else {
            "ERROR".bright_red().bold()
        };
        println!("  {:<24} {}", kind.name(), label);
    }

    let divergent = summary.divergent_stages();
    if !divergent.is_empty() {
        let names: Vec<&str> = divergent.iter().map(|k| k.name()).collect();
        println!(
            "  {} {}",
            "Status disagrees with artifacts:".yellow(),
            names.join(", ")
        );
    }

    if let Some(path) = &summary.final_report {
        println!("  Final report: {}", path.display().to_string().bright_black());
    }

    let elapsed = format!("{:.2}s", summary.elapsed.as_secs_f64());
    match summary.status() {
        RunStatus::Completed => println!(
            "\n{} in {}",
            "Pipeline COMPLETED".bright_green().bold(),
            elapsed
        ),
        RunStatus::WithErrors => println!(
            "\n{} in {}",
            "Pipeline completed WITH ERRORS".bright_red().bold(),
            elapsed
        ),
    }
}

fn run_quality_report(args: &QcArgs) -> Result<bool> {
    let table = load_sensor_table(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let analysis = QualityAnalysis::analyse(&table).context("Quality analysis failed")?;

    println!("{}", analysis.render(&table));
    Ok(true)
}

fn run_series(config: &PipelineConfig, args: &SeriesArgs) -> Result<bool> {
    let path = args
        .file
        .clone()
        .unwrap_or_else(|| config.forecast_series_path());
    let points = load_forecast(&path)
        .with_context(|| format!("Failed to load forecast {}", path.display()))?;

    let day = if args.today {
        Some(Local::now().date_naive())
    } else {
        args.day
    };
    let series = match day {
        Some(day) => series_for_day(&points, day),
        None => series_in_range(&points, args.start, args.end),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&series)?
    } else {
        serde_json::to_string(&series)?
    };
    println!("{}", json);
    Ok(true)
}
