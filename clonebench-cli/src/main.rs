// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! clonebench CLI
//!
//! Command-line interface for running round-trip timing suites.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

/// clonebench - structured-clone round-trip timing harness
#[derive(Parser)]
#[command(name = "clonebench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a benchmark suite and save a JSON report
    Run {
        /// Suite YAML file (built-in suite if omitted)
        #[arg(short, long)]
        suite: Option<PathBuf>,

        /// Output directory for reports
        #[arg(short, long, default_value = "data")]
        output: PathBuf,

        /// Only run benchmarks whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Override the iteration count of every benchmark
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Quick mode: 2 warm-up and 20 measured trials per benchmark
        #[arg(long, conflicts_with = "iterations")]
        quick: bool,

        /// Keep raw samples in the report
        #[arg(long)]
        samples: bool,
    },

    /// Validate a suite file
    Validate {
        /// Path to the suite file
        file: PathBuf,
    },

    /// List the benchmarks of a suite
    List {
        /// Suite YAML file (built-in suite if omitted)
        #[arg(short, long)]
        suite: Option<PathBuf>,
    },

    /// Print the summary of a saved report
    Show {
        /// Path to the report JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            suite,
            output,
            filter,
            iterations,
            quick,
            samples,
        } => {
            let options = commands::run::RunOptions {
                suite,
                output,
                filter,
                iterations,
                quick,
                keep_samples: samples,
            };
            commands::run::execute(options).await
        }
        Commands::Validate { file } => commands::validate::execute(&file),
        Commands::List { suite } => commands::list::execute(suite.as_deref()),
        Commands::Show { file } => commands::show::execute(&file),
    }
}
