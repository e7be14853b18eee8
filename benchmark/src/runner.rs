// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Runs every benchmark of a suite as one timing session.
//!
//! Sessions run one after another so they never compete for the runtime.
//! The first failing session aborts the run.

use clonebench_core::{
    BenchmarkSpec, BenchmarkSuite, HarnessResult, LatencyMetrics, RoundTripTimer, SampleCollector,
};

use crate::metrics::{BenchmarkReport, BenchmarkResult};

/// Sequential suite runner.
#[derive(Debug, Clone, Default)]
pub struct SuiteRunner {
    keep_raw_samples: bool,
}

impl SuiteRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep per-trial samples of the measured dimension in the report.
    pub fn keep_samples(mut self, keep: bool) -> Self {
        self.keep_raw_samples = keep;
        self
    }

    /// Run all benchmarks of `suite` into a report named `suite_id`.
    pub async fn run(
        &self,
        suite_id: &str,
        suite: &BenchmarkSuite,
    ) -> HarnessResult<BenchmarkReport> {
        let mut report = BenchmarkReport::new(suite_id);

        tracing::info!(suite = suite_id, benchmarks = suite.len(), "Running suite");

        for spec in &suite.benchmarks {
            let result = self.run_one(spec).await?;
            tracing::info!(
                benchmark = %spec.name,
                median = %LatencyMetrics::format_latency(result.latency.median_ns),
                p99 = %LatencyMetrics::format_latency(result.latency.p99_ns),
                "Benchmark complete"
            );
            report.add_result(result);
        }

        Ok(report)
    }

    /// Run a single benchmark session.
    pub async fn run_one(&self, spec: &BenchmarkSpec) -> HarnessResult<BenchmarkResult> {
        let timer = RoundTripTimer::configure(spec.session.clone())?;
        let session_id = timer.session_id();

        let mut collector = SampleCollector::new();
        let summary = timer.run()?.drive(&mut collector).await?;

        Ok(BenchmarkResult::from_collector(
            spec.name.as_str(),
            spec.description.clone(),
            spec.payload.describe(),
            summary.payload_bytes,
            summary.transport,
            summary.measured_dimension,
            session_id,
            spec.session.warm_up_count,
            &collector,
            self.keep_raw_samples,
        )
        .with_metadata("executed_trials", summary.executed))
    }
}
