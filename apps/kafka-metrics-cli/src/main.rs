//! Kafka metrics bridge CLI
//!
//! Replays recorded Kafka client instrumentation events through the
//! translator and prints the resulting metrics.

mod commands;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use kafka_metrics_core::{BackendKind, BridgeConfig};
use kafka_metrics_observability::{init_tracing, TracingConfig};
use output::OutputFormat;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "kafka-metrics",
    version,
    about = "Kafka client instrumentation to metrics bridge",
    long_about = "Translates Kafka client instrumentation events into counters,\n\
                  histograms and gauges.\n\n\
                  Events are read as JSON lines, one event per line."
)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, env = "KAFKA_METRICS_CONFIG")]
    config: Option<String>,

    /// Metrics backend (memory, prometheus)
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay JSON-lines events and print the resulting metrics
    Replay {
        /// Event file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Stop at the first event that cannot be translated
        #[arg(long)]
        strict: bool,
    },

    /// List recognized event names
    Events,

    /// List metric definitions
    Metrics,
}

fn load_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => BridgeConfig::load().context("Failed to load configuration")?,
    };

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    Ok(config)
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    let tracing_config = TracingConfig::from(&config.logging).with_colored_output(!cli.no_color);
    init_tracing(&tracing_config)?;

    match &cli.command {
        Commands::Replay { input, strict } => {
            commands::replay::run(&config, input, *strict, cli.format).await
        }
        Commands::Events => commands::events::run(cli.format),
        Commands::Metrics => commands::metrics::run(&config, cli.format),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}
