//! Theorem Control - CLI for the Theorem question pipeline
//!
//! Solves single questions, evaluates datasets and inspects the knowledge
//! table. Logs go to stderr; answers and JSON go to stdout.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use theorem_common::TheoremConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "theoremctl")]
#[command(about = "Theorem Assistant - answers short mathematical questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.config/theorem/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Solve {
        question: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a dataset file (JSON array of {"Question": ...} records)
    Eval {
        dataset: PathBuf,

        /// Number of questions taken from the start of the dataset
        #[arg(long)]
        samples: Option<usize>,

        /// Questions solved at the same time
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known concepts, or show one concept's facts
    Knowledge { concept: Option<String> },

    /// Print the effective configuration
    Config,
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TheoremConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    match cli.command {
        Commands::Solve { question, json } => commands::solve(&config, &question, json).await,
        Commands::Eval {
            dataset,
            samples,
            concurrency,
            json,
        } => commands::eval(&config, &dataset, samples, concurrency, json).await,
        Commands::Knowledge { concept } => commands::knowledge(&config, concept.as_deref()),
        Commands::Config => commands::show_config(&config),
    }
}
