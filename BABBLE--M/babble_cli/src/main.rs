use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use babble_learning::{Experiment, ExperimentConfig, ExperimentSnapshot, LearningTelemetry};
use chrono::Utc;
use clap::{Parser, Subcommand};
use shared_logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "babble", version, about = "Tool-use and vocal-label exploration runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs an experiment and prints its report.
    Run(RunArgs),
    /// Prints the default experiment config as TOML.
    Defaults,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Experiment config; defaults are used when absent.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Trials to run.
    #[arg(long, default_value_t = 1000)]
    iterations: u64,
    /// Seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Directory for the JSON-lines run log.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Also write per-trial debug records to the run log.
    #[arg(long)]
    verbose_log: bool,
    /// Prints the snapshot as JSON instead of the text report.
    #[arg(long)]
    json: bool,
    /// Writes the JSON snapshot to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => {
            let snapshot = handle_run(&args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{snapshot}");
            }
            Ok(())
        }
        Commands::Defaults => {
            println!("{}", default_config_toml()?);
            Ok(())
        }
    }
}

fn handle_run(args: &RunArgs) -> Result<ExperimentSnapshot> {
    let config = match &args.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };
    let mut builder = Experiment::builder().config(config);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if let Some(dir) = &args.log_dir {
        let level = if args.verbose_log {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
        let telemetry = LearningTelemetry::builder("babble")
            .log_path(compute_log_path(dir)?)
            .min_level(level)
            .build()?;
        builder = builder.telemetry(telemetry);
    }
    let mut experiment = builder.build()?;
    tracing::info!(run_id = %experiment.run_id(), iterations = args.iterations, "starting experiment");
    experiment.run(args.iterations)?;
    let snapshot = experiment.save();
    if let Some(path) = &args.out {
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(snapshot)
}

fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&ExperimentConfig::default()).context("failed to render default config")
}

fn compute_log_path(base: &Path) -> Result<PathBuf> {
    fs::create_dir_all(base).with_context(|| format!("failed to create {}", base.display()))?;
    Ok(base.join(format!("run-{}.log.jsonl", Utc::now().format("%Y%m%d-%H%M%S"))))
}
