// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML benchmark suite parser with strict validation.
//!
//! Suites are validated before anything runs. Any invalid field results in
//! a `ConfigurationError` that prevents the run from starting.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigurationError, HarnessError, HarnessResult};
use crate::payload::PayloadSpec;
use crate::timer::{SessionConfig, DEFAULT_ITERATION_COUNT, DEFAULT_WARM_UP_COUNT};
use crate::types::{BenchmarkName, MeasuredDimension, Transport};
use crate::value::Value;

/// Largest accepted iteration count.
pub const MAX_ITERATIONS: u32 = 1_000_000;

/// Largest accepted warm-up count.
pub const MAX_WARM_UP: u32 = 100_000;

/// Raw suite as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSuite {
    #[serde(default)]
    defaults: RawDefaults,
    benchmarks: Vec<RawBenchmark>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefaults {
    #[serde(default = "default_warm_up_count")]
    warm_up_count: u32,
    #[serde(default = "default_iteration_count")]
    iteration_count: u32,
}

fn default_warm_up_count() -> u32 {
    DEFAULT_WARM_UP_COUNT
}

fn default_iteration_count() -> u32 {
    DEFAULT_ITERATION_COUNT
}

impl Default for RawDefaults {
    fn default() -> Self {
        Self {
            warm_up_count: default_warm_up_count(),
            iteration_count: default_iteration_count(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBenchmark {
    name: String,
    #[serde(default)]
    description: Option<String>,
    payload: RawPayload,
    #[serde(default)]
    worker: bool,
    measure: MeasuredDimension,
    #[serde(default)]
    warm_up_count: Option<u32>,
    #[serde(default)]
    iteration_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PayloadKind {
    Literal,
    String,
    Bytes,
    IntArray,
    ObjectTree,
    Records,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPayload {
    kind: PayloadKind,
    #[serde(default)]
    value: Option<serde_yaml::Value>,
    #[serde(default)]
    length: Option<usize>,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default)]
    fanout: Option<u32>,
    #[serde(default)]
    count: Option<usize>,
}

/// Suite-wide defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteDefaults {
    pub warm_up_count: u32,
    pub iteration_count: u32,
}

/// Validated benchmark entry.
#[derive(Debug, Clone)]
pub struct BenchmarkSpec {
    pub name: BenchmarkName,
    pub description: Option<String>,
    pub payload: PayloadSpec,
    pub session: SessionConfig,
}

impl BenchmarkSpec {
    pub fn transport(&self) -> Transport {
        self.session.transport()
    }
}

/// Complete validated suite.
#[derive(Debug, Clone)]
pub struct BenchmarkSuite {
    pub defaults: SuiteDefaults,
    pub benchmarks: Vec<BenchmarkSpec>,
}

impl BenchmarkSuite {
    /// The standard matrix: every payload generator, both measured
    /// dimensions, both transports.
    pub fn builtin() -> HarnessResult<Self> {
        let payloads = [
            ("string-64k", PayloadKind::String, Some(64 * 1024), None, None, None),
            ("bytes-1m", PayloadKind::Bytes, Some(1024 * 1024), None, None, None),
            ("int-array-10k", PayloadKind::IntArray, Some(10_000), None, None, None),
            ("object-tree-d6f4", PayloadKind::ObjectTree, None, Some(6), Some(4), None),
            ("records-1k", PayloadKind::Records, None, None, None, Some(1000)),
        ];

        let mut benchmarks = Vec::new();
        for (label, kind, length, depth, fanout, count) in payloads {
            for measure in [MeasuredDimension::Send, MeasuredDimension::Receive] {
                for worker in [false, true] {
                    benchmarks.push(RawBenchmark {
                        name: format!(
                            "{}/{}/{}",
                            label,
                            measure,
                            Transport::from_secondary(worker)
                        ),
                        description: None,
                        payload: RawPayload {
                            kind,
                            value: None,
                            length,
                            depth,
                            fanout,
                            count,
                        },
                        worker,
                        measure,
                        warm_up_count: None,
                        iteration_count: None,
                    });
                }
            }
        }

        SuiteLoader::validate(RawSuite {
            defaults: RawDefaults::default(),
            benchmarks,
        })
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Keep only benchmarks whose name contains `pattern`.
    pub fn retain_matching(&mut self, pattern: &str) {
        self.benchmarks.retain(|b| b.name.as_str().contains(pattern));
    }

    /// Override warm-up and iteration counts of every benchmark.
    pub fn override_counts(
        &mut self,
        warm_up_count: Option<u32>,
        iteration_count: Option<u32>,
    ) -> Result<(), ConfigurationError> {
        if let Some(count) = warm_up_count {
            validate_warm_up(count)?;
        }
        if let Some(count) = iteration_count {
            validate_iterations(count)?;
        }

        for benchmark in &mut self.benchmarks {
            if let Some(count) = warm_up_count {
                benchmark.session.warm_up_count = count;
            }
            if let Some(count) = iteration_count {
                benchmark.session.iteration_count = count;
            }
        }
        Ok(())
    }
}

/// Suite loader with strict validation.
pub struct SuiteLoader;

impl SuiteLoader {
    /// Load and validate a suite from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> HarnessResult<BenchmarkSuite> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HarnessError::SuiteNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::Io {
            context: "reading suite file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a suite from a YAML string.
    pub fn load_string(content: &str) -> HarnessResult<BenchmarkSuite> {
        let raw: RawSuite = serde_yaml::from_str(content).map_err(|e| HarnessError::SuiteParse {
            message: format!("YAML parse error: {}", e),
        })?;

        Self::validate(raw)
    }

    fn validate(raw: RawSuite) -> HarnessResult<BenchmarkSuite> {
        validate_warm_up(raw.defaults.warm_up_count)?;
        validate_iterations(raw.defaults.iteration_count)?;
        let defaults = SuiteDefaults {
            warm_up_count: raw.defaults.warm_up_count,
            iteration_count: raw.defaults.iteration_count,
        };

        let mut benchmarks = Vec::with_capacity(raw.benchmarks.len());
        let mut seen_names = HashSet::new();

        for raw_benchmark in raw.benchmarks {
            let benchmark = Self::validate_benchmark(raw_benchmark, &defaults)?;

            if !seen_names.insert(benchmark.name.clone()) {
                return Err(ConfigurationError::DuplicateBenchmarkName {
                    name: benchmark.name.to_string(),
                }
                .into());
            }

            benchmarks.push(benchmark);
        }

        if benchmarks.is_empty() {
            return Err(ConfigurationError::SchemaValidation {
                message: "At least one benchmark must be defined".to_string(),
            }
            .into());
        }

        Ok(BenchmarkSuite {
            defaults,
            benchmarks,
        })
    }

    fn validate_benchmark(
        raw: RawBenchmark,
        defaults: &SuiteDefaults,
    ) -> Result<BenchmarkSpec, ConfigurationError> {
        let name = BenchmarkName::new(raw.name)?;

        let warm_up_count = raw.warm_up_count.unwrap_or(defaults.warm_up_count);
        validate_warm_up(warm_up_count)?;
        let iteration_count = raw.iteration_count.unwrap_or(defaults.iteration_count);
        validate_iterations(iteration_count)?;

        let payload = Self::validate_payload(raw.payload)?;
        let session = SessionConfig::new(payload.build()?, raw.measure)
            .warm_up(warm_up_count)
            .iterations(iteration_count)
            .secondary_channel(raw.worker);

        // Rejects non-transmissible and oversized payloads
        session.validate()?;

        Ok(BenchmarkSpec {
            name,
            description: raw.description,
            payload,
            session,
        })
    }

    fn validate_payload(raw: RawPayload) -> Result<PayloadSpec, ConfigurationError> {
        let spec = match raw.kind {
            PayloadKind::Literal => {
                let value = raw.value.ok_or_else(|| missing("value", "literal"))?;
                PayloadSpec::Literal(Value::from_yaml(&value)?)
            }
            PayloadKind::String => PayloadSpec::String {
                length: raw.length.ok_or_else(|| missing("length", "string"))?,
            },
            PayloadKind::Bytes => PayloadSpec::Bytes {
                length: raw.length.ok_or_else(|| missing("length", "bytes"))?,
            },
            PayloadKind::IntArray => PayloadSpec::IntArray {
                length: raw.length.ok_or_else(|| missing("length", "int_array"))?,
            },
            PayloadKind::ObjectTree => PayloadSpec::ObjectTree {
                depth: raw.depth.ok_or_else(|| missing("depth", "object_tree"))?,
                fanout: raw.fanout.ok_or_else(|| missing("fanout", "object_tree"))?,
            },
            PayloadKind::Records => PayloadSpec::Records {
                count: raw.count.ok_or_else(|| missing("count", "records"))?,
            },
        };

        spec.validate()?;
        Ok(spec)
    }
}

fn missing(field: &'static str, kind: &str) -> ConfigurationError {
    ConfigurationError::SchemaValidation {
        message: format!("Payload kind '{}' requires a non-null '{}' field", kind, field),
    }
}

fn validate_iterations(count: u32) -> Result<(), ConfigurationError> {
    if count == 0 {
        return Err(ConfigurationError::ZeroIterations);
    }
    if count > MAX_ITERATIONS {
        return Err(ConfigurationError::InvalidFieldValue {
            field: "iteration_count",
            value: count.to_string(),
            reason: format!("Must not exceed {}", MAX_ITERATIONS),
        });
    }
    Ok(())
}

fn validate_warm_up(count: u32) -> Result<(), ConfigurationError> {
    if count > MAX_WARM_UP {
        return Err(ConfigurationError::InvalidFieldValue {
            field: "warm_up_count",
            value: count.to_string(),
            reason: format!("Must not exceed {}", MAX_WARM_UP),
        });
    }
    Ok(())
}
