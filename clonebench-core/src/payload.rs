// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Payload generators.
//!
//! Suites describe payloads by shape rather than spelling them out, so a
//! megabyte buffer or a thousand records fit in one line of YAML.

use std::collections::BTreeMap;

use crate::codec::{MAX_DEPTH, MAX_PAYLOAD_SIZE};
use crate::error::ConfigurationError;
use crate::value::Value;

/// Upper bound on generated tree nodes.
const MAX_GENERATED_NODES: u64 = 1 << 20;

/// Upper bound on generated records.
const MAX_RECORDS: usize = 100_000;

/// A validated payload description.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSpec {
    /// A value given verbatim.
    Literal(Value),
    /// ASCII string of `length` characters.
    String { length: usize },
    /// Binary buffer of `length` bytes.
    Bytes { length: usize },
    /// Array of `length` integers.
    IntArray { length: usize },
    /// Maps nested `depth` levels deep with `fanout` children each.
    ObjectTree { depth: u32, fanout: u32 },
    /// Array of `count` small heterogeneous records.
    Records { count: usize },
}

impl PayloadSpec {
    /// Check generator parameters before anything is allocated.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            Self::Literal(_) => Ok(()),
            Self::String { length } | Self::Bytes { length } => {
                if *length > MAX_PAYLOAD_SIZE {
                    return Err(ConfigurationError::PayloadTooLarge {
                        size: *length,
                        max: MAX_PAYLOAD_SIZE,
                    });
                }
                Ok(())
            }
            Self::IntArray { length } => {
                // One tag byte plus eight value bytes per element
                let size = length.saturating_mul(9);
                if size > MAX_PAYLOAD_SIZE {
                    return Err(ConfigurationError::PayloadTooLarge {
                        size,
                        max: MAX_PAYLOAD_SIZE,
                    });
                }
                Ok(())
            }
            Self::ObjectTree { depth, fanout } => {
                if *depth as usize >= MAX_DEPTH {
                    return Err(ConfigurationError::InvalidFieldValue {
                        field: "depth",
                        value: depth.to_string(),
                        reason: format!("Must be below {}", MAX_DEPTH),
                    });
                }
                if *fanout == 0 || *fanout > 64 {
                    return Err(ConfigurationError::InvalidFieldValue {
                        field: "fanout",
                        value: fanout.to_string(),
                        reason: "Must be between 1 and 64".to_string(),
                    });
                }
                let nodes = tree_nodes(*depth, *fanout);
                if nodes > MAX_GENERATED_NODES {
                    return Err(ConfigurationError::InvalidFieldValue {
                        field: "fanout",
                        value: fanout.to_string(),
                        reason: format!(
                            "Tree of depth {} would have {} nodes (max {})",
                            depth, nodes, MAX_GENERATED_NODES
                        ),
                    });
                }
                Ok(())
            }
            Self::Records { count } => {
                if *count > MAX_RECORDS {
                    return Err(ConfigurationError::InvalidFieldValue {
                        field: "count",
                        value: count.to_string(),
                        reason: format!("Must not exceed {}", MAX_RECORDS),
                    });
                }
                Ok(())
            }
        }
    }

    /// Generate the payload value.
    pub fn build(&self) -> Result<Value, ConfigurationError> {
        self.validate()?;

        Ok(match self {
            Self::Literal(value) => value.clone(),
            Self::String { length } => Value::String(
                (b'a'..=b'z')
                    .cycle()
                    .take(*length)
                    .map(char::from)
                    .collect(),
            ),
            Self::Bytes { length } => Value::Bytes((0..*length).map(|i| (i % 251) as u8).collect()),
            Self::IntArray { length } => {
                Value::Array((0..*length).map(|i| Value::Int(i as i64)).collect())
            }
            Self::ObjectTree { depth, fanout } => object_tree(0, *depth, *fanout),
            Self::Records { count } => Value::Array((0..*count).map(record).collect()),
        })
    }

    /// Short human-readable description used in reports.
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(value) => format!("literal({}, {} nodes)", value.kind(), value.node_count()),
            Self::String { length } => format!("string({})", length),
            Self::Bytes { length } => format!("bytes({})", length),
            Self::IntArray { length } => format!("int_array({})", length),
            Self::ObjectTree { depth, fanout } => {
                format!("object_tree(depth={}, fanout={})", depth, fanout)
            }
            Self::Records { count } => format!("records({})", count),
        }
    }
}

fn tree_nodes(depth: u32, fanout: u32) -> u64 {
    let mut level = 1u64;
    let mut total = 1u64;
    for _ in 0..depth {
        level = level.saturating_mul(u64::from(fanout));
        total = total.saturating_add(level);
    }
    total
}

fn object_tree(level: u32, depth: u32, fanout: u32) -> Value {
    if level == depth {
        return Value::Int(i64::from(level));
    }

    Value::Map(
        (0..fanout)
            .map(|i| (format!("k{}", i), object_tree(level + 1, depth, fanout)))
            .collect(),
    )
}

fn record(i: usize) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("id".to_string(), Value::Int(i as i64));
    fields.insert("name".to_string(), Value::String(format!("record-{}", i)));
    fields.insert("score".to_string(), Value::Float(i as f64 * 0.5));
    fields.insert("active".to_string(), Value::Bool(i % 2 == 0));
    fields.insert(
        "tags".to_string(),
        Value::Array(vec![Value::from("alpha"), Value::from("beta")]),
    );
    fields.insert(
        "checksum".to_string(),
        Value::Bytes((i as u64).to_le_bytes().to_vec()),
    );
    fields.insert("parent".to_string(), Value::Null);
    Value::Map(fields)
}
