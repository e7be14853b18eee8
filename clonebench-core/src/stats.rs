// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Latency statistics and the default sample-collecting aggregator.

use serde::{Deserialize, Serialize};

use crate::timer::{Aggregator, Trial};

/// Latency metrics with percentile distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Number of samples the metrics were computed from
    pub count: usize,
    /// Minimum observed latency in nanoseconds
    pub min_ns: u64,
    /// Maximum observed latency in nanoseconds
    pub max_ns: u64,
    /// Arithmetic mean latency in nanoseconds
    pub mean_ns: f64,
    /// Median (p50) latency in nanoseconds
    pub median_ns: u64,
    /// 95th percentile latency in nanoseconds
    pub p95_ns: u64,
    /// 99th percentile latency in nanoseconds
    pub p99_ns: u64,
    /// Standard deviation in nanoseconds
    pub std_dev_ns: f64,
    /// Raw sample data (optional, downsampled when large)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<u64>>,
}

impl LatencyMetrics {
    /// Calculate metrics from latency samples in nanoseconds.
    pub fn from_samples(mut samples: Vec<u64>, keep_raw: bool) -> Self {
        if samples.is_empty() {
            return Self {
                count: 0,
                min_ns: 0,
                max_ns: 0,
                mean_ns: 0.0,
                median_ns: 0,
                p95_ns: 0,
                p99_ns: 0,
                std_dev_ns: 0.0,
                samples: None,
            };
        }

        samples.sort_unstable();
        let len = samples.len();

        let sum: u128 = samples.iter().map(|&x| u128::from(x)).sum();
        let mean_ns = sum as f64 / len as f64;
        let variance = samples
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean_ns;
                diff * diff
            })
            .sum::<f64>()
            / len as f64;

        let raw_samples = if !keep_raw {
            None
        } else if len > 10_000 {
            Some(samples.iter().step_by(len / 1000).copied().collect())
        } else {
            Some(samples.clone())
        };

        Self {
            count: len,
            min_ns: samples[0],
            max_ns: samples[len - 1],
            mean_ns,
            median_ns: samples[len / 2],
            p95_ns: samples[percentile_index(len, 0.95)],
            p99_ns: samples[percentile_index(len, 0.99)],
            std_dev_ns: variance.sqrt(),
            samples: raw_samples,
        }
    }

    /// Calculate metrics from durations in milliseconds.
    pub fn from_millis(samples: &[f64], keep_raw: bool) -> Self {
        Self::from_samples(samples.iter().map(|&ms| millis_to_nanos(ms)).collect(), keep_raw)
    }

    /// Format latency in human-readable form (auto-selects ns/μs/ms).
    pub fn format_latency(ns: u64) -> String {
        if ns < 1_000 {
            format!("{}ns", ns)
        } else if ns < 1_000_000 {
            format!("{:.2}μs", ns as f64 / 1_000.0)
        } else if ns < 1_000_000_000 {
            format!("{:.2}ms", ns as f64 / 1_000_000.0)
        } else {
            format!("{:.2}s", ns as f64 / 1_000_000_000.0)
        }
    }
}

fn percentile_index(len: usize, quantile: f64) -> usize {
    ((len as f64 * quantile) as usize).min(len - 1)
}

/// Convert milliseconds to whole nanoseconds, clamping negatives to zero.
pub fn millis_to_nanos(ms: f64) -> u64 {
    (ms * 1_000_000.0).round().max(0.0) as u64
}

/// Aggregator that keeps every accepted sample.
#[derive(Debug, Default, Clone)]
pub struct SampleCollector {
    selected_ms: Vec<f64>,
    send_ms: Vec<f64>,
    receive_ms: Vec<f64>,
    trials: Vec<Trial>,
    done_signals: u32,
}

impl SampleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations of the measured dimension, in arrival order.
    pub fn values(&self) -> &[f64] {
        &self.selected_ms
    }

    pub fn send_durations(&self) -> &[f64] {
        &self.send_ms
    }

    pub fn receive_durations(&self) -> &[f64] {
        &self.receive_ms
    }

    /// Accepted trials, in arrival order.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Whether the session signalled completion.
    pub fn is_done(&self) -> bool {
        self.done_signals > 0
    }

    /// How many times `done()` was signalled.
    pub fn done_signals(&self) -> u32 {
        self.done_signals
    }

    /// Metrics of the measured dimension.
    pub fn metrics(&self, keep_raw: bool) -> LatencyMetrics {
        LatencyMetrics::from_millis(&self.selected_ms, keep_raw)
    }

    pub fn send_metrics(&self) -> LatencyMetrics {
        LatencyMetrics::from_millis(&self.send_ms, false)
    }

    pub fn receive_metrics(&self) -> LatencyMetrics {
        LatencyMetrics::from_millis(&self.receive_ms, false)
    }
}

impl Aggregator for SampleCollector {
    fn record(&mut self, trial: &Trial, value_ms: f64) {
        self.selected_ms.push(value_ms);
        self.send_ms.push(trial.send_duration());
        self.receive_ms.push(trial.receive_duration());
        self.trials.push(*trial);
    }

    fn done(&mut self) {
        self.done_signals += 1;
    }
}
