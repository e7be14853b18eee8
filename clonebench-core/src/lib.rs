// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! clonebench Core Library
//!
//! Measures what it costs to hand a structured value from one execution
//! context to another. Provides the value model and wire codec, the
//! loopback and worker channel pairs, the round-trip timing session and
//! the YAML suite loader.

pub mod channel;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod payload;
pub mod stats;
pub mod timer;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use channel::{
    Channel, ChannelCloser, ClonedPayload, Endpoint, ListenerId, ListenerTable, Materialize,
    MessageEvent, Subscription,
};
pub use clock::{Clock, MonotonicClock, SteppingClock};
pub use config::{BenchmarkSpec, BenchmarkSuite, SuiteLoader};
pub use error::{ConfigurationError, HarnessError, HarnessResult, MaterializationError};
pub use payload::PayloadSpec;
pub use stats::{LatencyMetrics, SampleCollector};
pub use timer::{
    Aggregator, RoundTripTimer, SessionConfig, SessionState, SessionSummary, Trial, TrialStream,
};
pub use types::{BenchmarkName, MeasuredDimension, Transport};
pub use value::Value;
