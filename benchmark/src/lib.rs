// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! clonebench Benchmarking Framework
//!
//! Runs benchmark suites through the round-trip timer and turns the
//! collected samples into JSON reports.
//!
//! # Data Output
//!
//! Every run produces one report with the host description and, per
//! benchmark, the measured-dimension latency distribution plus the send and
//! receive distributions.

pub mod metrics;
pub mod reporter;
pub mod runner;

pub use metrics::{BenchmarkReport, BenchmarkResult, SystemInfo, ThroughputMetrics};
pub use reporter::{JsonReporter, ReporterError};
pub use runner::SuiteRunner;
