// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for clonebench.
//!
//! Every failure is an explicit enum variant. Sessions never retry: a timing
//! measurement that silently absorbed a retry would be skewed.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the round-trip harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    // =========================================================================
    // Configuration Errors - Fail-Fast before any trial runs
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Suite file not found: {path}")]
    SuiteNotFound { path: PathBuf },

    #[error("Suite parse error: {message}")]
    SuiteParse { message: String },

    // =========================================================================
    // Session Errors - abort the session, done() is never signalled
    // =========================================================================
    #[error("Channel closed: {reason}")]
    ChannelClosed { reason: String },

    #[error("Materialization failed: {0}")]
    Materialization(#[from] MaterializationError),

    #[error("Session cannot be driven: {reason}")]
    SessionConsumed { reason: String },

    // =========================================================================
    // Endpoint Errors
    // =========================================================================
    #[error("Failed to spawn worker endpoint: {reason}")]
    WorkerSpawn { reason: String },

    #[error("No async runtime available: {reason}")]
    RuntimeUnavailable { reason: String },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub(crate) fn closed(reason: impl Into<String>) -> Self {
        Self::ChannelClosed {
            reason: reason.into(),
        }
    }
}

/// Invalid session or suite parameters. Surfaced synchronously.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Iteration count must be greater than zero")]
    ZeroIterations,

    #[error("Payload is not transmissible: {kind} at {path}")]
    NotTransmissible { path: String, kind: String },

    #[error("Payload nesting exceeds maximum depth {max} at {path}")]
    DepthExceeded { path: String, max: usize },

    #[error("Payload size exceeds maximum: {size} > {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate benchmark name: {name}")]
    DuplicateBenchmarkName { name: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// The received copy could not be fully realized.
#[derive(Debug, Error)]
pub enum MaterializationError {
    #[error("Truncated payload: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Unsupported wire version: {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Envelope length mismatch: header says {declared}, body has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Payload checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Unknown value tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("Invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Nesting exceeds maximum depth {max} at offset {offset}")]
    DepthExceeded { offset: usize, max: usize },

    #[error("{count} trailing bytes after value")]
    TrailingBytes { count: usize },

    #[error("Receiver could not deserialize message: {reason}")]
    ReceiverFailed { reason: String },
}

/// Result type alias using HarnessError.
pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::NotTransmissible {
            path: "$.handler".to_string(),
            kind: "function".to_string(),
        };
        assert!(err.to_string().contains("$.handler"));
        assert!(err.to_string().contains("function"));
    }

    #[test]
    fn test_error_chain() {
        let harness_err: HarnessError = ConfigurationError::ZeroIterations.into();
        assert!(matches!(
            harness_err,
            HarnessError::Configuration(ConfigurationError::ZeroIterations)
        ));

        let harness_err: HarnessError = MaterializationError::TrailingBytes { count: 3 }.into();
        assert!(matches!(harness_err, HarnessError::Materialization(_)));
    }

    #[test]
    fn test_checksum_display_is_hex() {
        let err = MaterializationError::ChecksumMismatch {
            expected: 0xdead_beef,
            actual: 1,
        };
        assert!(err.to_string().contains("0xdeadbeef"));
    }
}
