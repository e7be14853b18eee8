// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `clonebench run` command - Run a suite and save a report.

use std::path::PathBuf;

use clonebench_benchmark::{JsonReporter, SuiteRunner};

use super::{load_suite, show, CliError};

/// Quick mode trial counts.
const QUICK_WARM_UP: u32 = 2;
const QUICK_ITERATIONS: u32 = 20;

pub struct RunOptions {
    pub suite: Option<PathBuf>,
    pub output: PathBuf,
    pub filter: Option<String>,
    pub iterations: Option<u32>,
    pub quick: bool,
    pub keep_samples: bool,
}

pub async fn execute(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (suite_id, mut suite) = load_suite(options.suite.as_deref())?;

    if let Some(filter) = &options.filter {
        suite.retain_matching(filter);
        if suite.is_empty() {
            return Err(CliError::NoMatchingBenchmarks {
                filter: filter.clone(),
            }
            .into());
        }
    }

    if options.quick {
        suite.override_counts(Some(QUICK_WARM_UP), Some(QUICK_ITERATIONS))?;
    } else {
        suite.override_counts(None, options.iterations)?;
    }

    // Fail before running anything if the report cannot be written
    let reporter = JsonReporter::new(&options.output)?;

    println!("clonebench suite: {}", suite_id);
    println!("Benchmarks:       {}", suite.len());
    println!("Output directory: {}", reporter.output_dir().display());
    println!();

    let report = SuiteRunner::new()
        .keep_samples(options.keep_samples)
        .run(&suite_id, &suite)
        .await?;

    let path = reporter.save(&report)?;

    show::print_summary(&report);
    println!();
    println!("Report saved to: {}", path.display());

    Ok(())
}
