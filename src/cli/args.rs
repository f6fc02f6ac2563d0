//! Command-line argument definitions for tidewatch
//!
//! The CLI is defined with the clap derive API. Shared options live on the
//! top-level `Args`; each subcommand carries its own arguments.

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Tide sensor quality control and forecasting pipeline
///
/// Loads raw Keller/Vega tide gauge records with their ancillary weather
/// channels, runs the analysis stages and reports which of them produced
/// their artifacts.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tidewatch",
    version,
    about = "Quality control and forecasting pipeline for tide gauge sensors"
)]
pub struct Args {
    /// Configuration file (TOML)
    ///
    /// Defaults to <config dir>/tidewatch/config.toml when that file exists.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Working directory holding the raw file and output directories
    #[arg(short = 'w', long = "work-dir", value_name = "PATH", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v: debug, -vv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the full pipeline: basic analysis, quality control, forecasting
    Run(RunArgs),
    /// Print the quality control report for one raw file
    Qc(QcArgs),
    /// Print forecast series as JSON for dashboards
    Series(SeriesArgs),
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RunArgs {
    /// Raw sensor file name inside the working directory
    #[arg(long = "raw-file", value_name = "NAME")]
    pub raw_file: Option<String>,

    /// Directory searched for the raw file when it is not staged yet
    #[arg(long = "fallback-dir", value_name = "PATH")]
    pub fallback_dir: Option<PathBuf>,

    /// External forecasting program; receives the daily means file as last argument
    #[arg(long = "forecast-command", value_name = "PROGRAM")]
    pub forecast_command: Option<PathBuf>,

    /// Extra arguments passed to the forecasting program before the daily file
    #[arg(
        long = "forecast-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        requires = "forecast_command"
    )]
    pub forecast_args: Vec<String>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct QcArgs {
    /// Raw sensor file to analyse
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SeriesArgs {
    /// Forecast CSV; defaults to the forecast file in the results directory
    #[arg(long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long = "start", value_name = "DATE", conflicts_with = "day")]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long = "end", value_name = "DATE", conflicts_with = "day")]
    pub end: Option<NaiveDate>,

    /// Single day to show with time-of-day labels (YYYY-MM-DD)
    #[arg(long = "day", value_name = "DATE")]
    pub day: Option<NaiveDate>,

    /// Show today's series; same as --day with the local date
    #[arg(long = "today", conflicts_with_all = ["day", "start", "end"])]
    pub today: bool,

    /// Pretty-print the JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_forecaster_arguments() {
        let args = Args::parse_from([
            "tidewatch",
            "-w",
            "/srv/tide",
            "run",
            "--forecast-command",
            "/opt/model/forecast",
            "--forecast-arg",
            "--horizon=7",
        ]);

        assert_eq!(args.work_dir, Some(PathBuf::from("/srv/tide")));
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.forecast_command, Some(PathBuf::from("/opt/model/forecast")));
                assert_eq!(run.forecast_args, vec!["--horizon=7"]);
            }
            other => panic!("expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_series_dates_are_parsed() {
        let args = Args::parse_from(["tidewatch", "series", "--start", "2024-03-01", "--end", "2024-03-07"]);
        match args.command {
            Command::Series(series) => {
                assert_eq!(series.start, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(series.end, NaiveDate::from_ymd_opt(2024, 3, 7));
            }
            other => panic!("expected series command, got {:?}", other),
        }
    }

    #[test]
    fn test_series_today_conflicts_with_range() {
        let result = Args::try_parse_from(["tidewatch", "series", "--today", "--start", "2024-03-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_levels() {
        let quiet = Args::parse_from(["tidewatch", "-q", "run"]);
        assert_eq!(quiet.get_log_level(), "error");
        let verbose = Args::parse_from(["tidewatch", "-vv", "run"]);
        assert_eq!(verbose.get_log_level(), "trace");
    }
}
