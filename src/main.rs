use clap::Parser;
use colored::*;
use std::process;
use tidewatch::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    match commands::run(args) {
        Ok(true) => process::exit(0),
        // the pipeline ran but at least one stage produced no artifacts
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
            process::exit(2);
        }
    }
}
