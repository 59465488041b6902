//! TickLab CLI — run and validate commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file
//! - `validate` — parse a config and build everything without running

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use ticklab_runner::{run_from_config, validate_config, RunConfig, RunReport};

#[derive(Parser)]
#[command(
    name = "ticklab",
    about = "TickLab CLI — update-driven backtesting engine"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write the JSON run report here (printed to stdout otherwise).
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write executions as JSONL here (overrides `output.executions`).
        #[arg(long)]
        executions: Option<PathBuf>,
    },
    /// Parse and validate a config file without running it.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            report,
            executions,
        } => run_cmd(&config, report.as_deref(), executions.as_deref()),
        Commands::Validate { config } => validate_cmd(&config),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn run_cmd(config_path: &Path, report_path: Option<&Path>, executions: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let report = run_from_config(&config, executions)
        .with_context(|| format!("running {}", config_path.display()))?;

    let json = serde_json::to_string_pretty(&report)?;
    match report_path {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("writing report to {}", path.display()))?;
            print_summary(&report);
            println!("Report saved to: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let run_id = validate_config(&config)
        .with_context(|| format!("validating {}", config_path.display()))?;

    println!("Config OK: {}", config_path.display());
    println!("Run ID:   {run_id}");
    println!("Features: {}", config.features.len());
    Ok(())
}

fn print_summary(report: &RunReport) {
    let s = &report.summary;
    println!();
    println!("=== Run Result ===");
    println!("Run ID:         {}", report.run_id);
    println!(
        "Updates:        {} ({} skipped)",
        s.updates_processed, s.updates_skipped
    );
    println!("Instruments:    {}", s.instruments);
    println!("Feature passes: {}", s.feature_passes);
    println!(
        "Pass time:      {:.2}ms last, {:.2}ms avg",
        report.last_pass_ms, s.average_pass_ms
    );
    println!("Executions:     {}", s.executions);
    if let Some(path) = &report.executions_path {
        println!("Executions to:  {}", path.display());
    }
}
