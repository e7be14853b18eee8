// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `clonebench list` command - List the benchmarks of a suite.

use std::path::Path;

use super::load_suite;

pub fn execute(suite_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (suite_id, suite) = load_suite(suite_path)?;

    println!("Suite: {}", suite_id);
    println!();
    println!(
        "{:<36} {:<28} {:<9} {:<8} {:>7} {:>10}",
        "NAME", "PAYLOAD", "TRANSPORT", "MEASURE", "WARM-UP", "ITERATIONS"
    );

    for benchmark in &suite.benchmarks {
        println!(
            "{:<36} {:<28} {:<9} {:<8} {:>7} {:>10}",
            benchmark.name.as_str(),
            benchmark.payload.describe(),
            benchmark.transport().name(),
            benchmark.session.measured_dimension.name(),
            benchmark.session.warm_up_count,
            benchmark.session.iteration_count
        );
    }

    println!();
    println!("Total: {} benchmark(s)", suite.len());

    Ok(())
}
