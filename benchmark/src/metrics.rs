// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Report data types for suite runs.
//!
//! A report is one suite run on one host: the host description plus one
//! [`BenchmarkResult`] per session.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clonebench_core::{LatencyMetrics, MeasuredDimension, SampleCollector, Transport};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use uuid::Uuid;

/// Effective copy throughput derived from the mean latency of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    /// Encoded payload bytes moved per second
    pub bytes_per_sec: f64,
    /// Payload copies per second
    pub messages_per_sec: f64,
}

impl ThroughputMetrics {
    /// Derive throughput from the encoded payload size and mean latency.
    ///
    /// Returns `None` when the mean latency is zero.
    pub fn from_latency(payload_bytes: usize, mean_ns: f64) -> Option<Self> {
        if mean_ns <= 0.0 {
            return None;
        }
        let messages_per_sec = 1_000_000_000.0 / mean_ns;
        Some(Self {
            bytes_per_sec: payload_bytes as f64 * messages_per_sec,
            messages_per_sec,
        })
    }

    /// Format throughput in human-readable form.
    pub fn format_bytes_per_sec(bps: f64) -> String {
        if bps < 1_000.0 {
            format!("{:.2} B/s", bps)
        } else if bps < 1_000_000.0 {
            format!("{:.2} KB/s", bps / 1_000.0)
        } else if bps < 1_000_000_000.0 {
            format!("{:.2} MB/s", bps / 1_000_000.0)
        } else {
            format!("{:.2} GB/s", bps / 1_000_000_000.0)
        }
    }
}

/// Host the suite ran on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let unknown = || "Unknown".to_string();
        Self {
            os: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_else(unknown),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(unknown),
        }
    }
}

/// Outcome of one benchmark session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Payload shape, e.g. `records(1000)`
    pub payload: String,
    /// Encoded payload size in bytes
    pub payload_bytes: usize,
    pub transport: Transport,
    pub measured_dimension: MeasuredDimension,
    pub session_id: Uuid,
    pub warm_up_count: u32,
    pub iteration_count: u32,
    /// Metrics of the measured dimension
    pub latency: LatencyMetrics,
    pub send: LatencyMetrics,
    pub receive: LatencyMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<ThroughputMetrics>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Build a result from the samples of a completed session.
    #[allow(clippy::too_many_arguments)]
    pub fn from_collector(
        name: impl Into<String>,
        description: Option<String>,
        payload: impl Into<String>,
        payload_bytes: usize,
        transport: Transport,
        measured_dimension: MeasuredDimension,
        session_id: Uuid,
        warm_up_count: u32,
        collector: &SampleCollector,
        keep_raw_samples: bool,
    ) -> Self {
        let latency = collector.metrics(keep_raw_samples);
        let throughput = ThroughputMetrics::from_latency(payload_bytes, latency.mean_ns);

        Self {
            name: name.into(),
            description,
            payload: payload.into(),
            payload_bytes,
            transport,
            measured_dimension,
            session_id,
            warm_up_count,
            iteration_count: collector.len() as u32,
            latency,
            send: collector.send_metrics(),
            receive: collector.receive_metrics(),
            throughput,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the result.
    ///
    /// Values that cannot be represented as JSON are skipped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), value);
        }
        self
    }
}

/// Complete suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier, `builtin` or the suite file stem
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            benchmark_suite: suite.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    /// Look up a result by benchmark name.
    pub fn find(&self, name: &str) -> Option<&BenchmarkResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clonebench_core::{Aggregator, RoundTripTimer, SessionConfig, SteppingClock};

    async fn collect(iterations: u32) -> (SampleCollector, Uuid) {
        let config = SessionConfig::new("ping", MeasuredDimension::Receive)
            .warm_up(0)
            .iterations(iterations);
        let timer = RoundTripTimer::with_clock(config, SteppingClock::new(0.5)).unwrap();
        let session_id = timer.session_id();
        let mut collector = SampleCollector::new();
        timer
            .run()
            .unwrap()
            .drive(&mut collector)
            .await
            .unwrap();
        (collector, session_id)
    }

    #[test]
    fn test_throughput_from_latency() {
        let metrics = ThroughputMetrics::from_latency(1000, 1_000_000.0).unwrap();
        assert!((metrics.messages_per_sec - 1000.0).abs() < 0.01);
        assert!((metrics.bytes_per_sec - 1_000_000.0).abs() < 0.01);
        assert!(ThroughputMetrics::from_latency(1000, 0.0).is_none());
    }

    #[test]
    fn test_throughput_format() {
        assert_eq!(ThroughputMetrics::format_bytes_per_sec(512.0), "512.00 B/s");
        assert_eq!(ThroughputMetrics::format_bytes_per_sec(2_500_000.0), "2.50 MB/s");
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
    }

    #[tokio::test]
    async fn test_result_from_collector() {
        let (collector, session_id) = collect(4).await;
        let result = BenchmarkResult::from_collector(
            "ping/receive/loopback",
            None,
            "literal(string, 1 nodes)",
            17,
            Transport::Loopback,
            MeasuredDimension::Receive,
            session_id,
            0,
            &collector,
            true,
        )
        .with_metadata("note", "stepping clock");

        assert_eq!(result.iteration_count, 4);
        assert_eq!(result.latency.count, 4);
        // Every clock read advances 0.5ms
        assert_eq!(result.send.median_ns, 500_000);
        assert_eq!(result.receive.median_ns, 500_000);
        assert_eq!(result.latency.samples.as_ref().map(Vec::len), Some(4));
        assert!(result.throughput.is_some());

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("\"transport\": \"loopback\""));
        assert!(json.contains("\"measured_dimension\": \"receive\""));
        assert!(json.contains("note"));
    }

    #[test]
    fn test_report_find() {
        let mut collector = SampleCollector::new();
        collector.done();

        let mut report = BenchmarkReport::new("unit");
        report.add_result(BenchmarkResult::from_collector(
            "empty",
            None,
            "string(0)",
            13,
            Transport::Worker,
            MeasuredDimension::Send,
            Uuid::new_v4(),
            0,
            &collector,
            false,
        ));

        assert!(report.find("empty").is_some());
        assert!(report.find("missing").is_none());
        assert!(report.results[0].throughput.is_none());
    }
}
