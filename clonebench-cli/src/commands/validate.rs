// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `clonebench validate` command - Validate a suite file.

use std::path::Path;

use clonebench_core::SuiteLoader;

pub fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file.display(), "Validating suite");

    match SuiteLoader::load_file(file) {
        Ok(suite) => {
            println!("✓ Suite is valid");
            println!();
            println!("Defaults:");
            println!("  Warm-up Trials:   {}", suite.defaults.warm_up_count);
            println!("  Measured Trials:  {}", suite.defaults.iteration_count);
            println!();
            println!("Benchmarks ({}):", suite.len());
            for benchmark in &suite.benchmarks {
                println!(
                    "  - {} ({}, {}, measure: {}, warm-up: {}, iterations: {})",
                    benchmark.name,
                    benchmark.payload.describe(),
                    benchmark.transport(),
                    benchmark.session.measured_dimension,
                    benchmark.session.warm_up_count,
                    benchmark.session.iteration_count
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Suite validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
