// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers and small enums shared across the harness.
//!
//! Validated types check their invariants at creation time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Maximum length of a benchmark name.
const MAX_NAME_LEN: usize = 128;

/// Validated benchmark name.
/// Must be non-empty, max 128 chars, alphanumeric plus `-`, `_`, `.` and `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BenchmarkName(String);

impl BenchmarkName {
    /// Create a new BenchmarkName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ConfigurationError::InvalidFieldValue {
                field: "name",
                value: name,
                reason: "Benchmark name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_NAME_LEN {
            return Err(ConfigurationError::InvalidFieldValue {
                field: "name",
                value: name.clone(),
                reason: format!(
                    "Benchmark name too long: {} chars (max {})",
                    name.len(),
                    MAX_NAME_LEN
                ),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        {
            return Err(ConfigurationError::InvalidFieldValue {
                field: "name",
                value: name,
                reason: "Benchmark name may only contain ASCII alphanumerics, '-', '_', '.' and '/'"
                    .to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BenchmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BenchmarkName {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BenchmarkName> for String {
    fn from(name: BenchmarkName) -> Self {
        name.0
    }
}

/// Which phase of a trial is handed to the aggregator as its scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasuredDimension {
    /// Outbound hand-off: serialize and enqueue.
    #[serde(alias = "serialize")]
    Send,
    /// Inbound materialization: delivery plus full deserialize.
    #[serde(alias = "deserialize")]
    Receive,
}

impl MeasuredDimension {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
        }
    }
}

impl fmt::Display for MeasuredDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The kind of endpoint a session exchanges payloads with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// The orchestrating context posts to itself.
    Loopback,
    /// A dedicated worker thread echoes every payload back.
    Worker,
}

impl Transport {
    /// Transport selected by a session's `use_secondary_channel` flag.
    pub const fn from_secondary(use_secondary_channel: bool) -> Self {
        if use_secondary_channel {
            Self::Worker
        } else {
            Self::Loopback
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loopback => "loopback",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
