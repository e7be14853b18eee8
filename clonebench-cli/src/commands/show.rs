// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `clonebench show` command - Print the summary of a saved report.

use std::path::Path;

use clonebench_benchmark::{BenchmarkReport, JsonReporter, ThroughputMetrics};
use clonebench_core::LatencyMetrics;

pub fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = JsonReporter::load(file)?;

    println!(
        "Suite {} (v{}) at {}",
        report.benchmark_suite,
        report.version,
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "Host  {} {} / {} ({} cores)",
        report.system_info.os,
        report.system_info.os_version,
        report.system_info.cpu_model,
        report.system_info.cpu_cores
    );
    println!();
    print_summary(&report);

    Ok(())
}

/// Print one line per benchmark result.
pub fn print_summary(report: &BenchmarkReport) {
    println!(
        "{:<36} {:>8} {:>9} {:>12} {:>12} {:>12} {:>14}",
        "BENCHMARK", "MEASURE", "BYTES", "MEDIAN", "P95", "P99", "THROUGHPUT"
    );
    println!("{}", "─".repeat(108));

    for result in &report.results {
        let throughput = result
            .throughput
            .as_ref()
            .map(|t| ThroughputMetrics::format_bytes_per_sec(t.bytes_per_sec))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<36} {:>8} {:>9} {:>12} {:>12} {:>12} {:>14}",
            result.name,
            result.measured_dimension.name(),
            result.payload_bytes,
            LatencyMetrics::format_latency(result.latency.median_ns),
            LatencyMetrics::format_latency(result.latency.p95_ns),
            LatencyMetrics::format_latency(result.latency.p99_ns),
            throughput
        );
    }

    println!();
    println!("Total: {} benchmark(s)", report.results.len());
}
