// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Structured payload values.
//!
//! A [`Value`] is the unit a session sends across a channel pair. Every
//! variant except [`Value::Opaque`] can be structurally copied by the
//! wire codec.

use std::collections::BTreeMap;

use crate::error::ConfigurationError;

/// A structured value that can be posted between contexts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Raw binary buffer, copied byte for byte.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// String-keyed record with deterministic key order.
    Map(BTreeMap<String, Value>),
    /// A host object that can be referenced but never copied
    /// (a function, a live socket). Rejected by the codec.
    Opaque(String),
}

impl Value {
    /// Short name of the variant, used in error paths and logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Opaque(_) => "opaque",
        }
    }

    /// Total number of nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        match self {
            Self::Array(items) => 1 + items.iter().map(Value::node_count).sum::<usize>(),
            Self::Map(entries) => 1 + entries.values().map(Value::node_count).sum::<usize>(),
            _ => 1,
        }
    }

    /// Convert a YAML document into a payload value.
    ///
    /// Scalar map keys are stringified. A tagged node such as `!function f`
    /// becomes an [`Value::Opaque`] of that tag, which lets suite files
    /// describe non-transmissible payloads.
    pub fn from_yaml(yaml: &serde_yaml::Value) -> Result<Self, ConfigurationError> {
        use serde_yaml::Value as Yaml;

        Ok(match yaml {
            Yaml::Null => Self::Null,
            Yaml::Bool(b) => Self::Bool(*b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => Self::String(s.clone()),
            Yaml::Sequence(items) => Self::Array(
                items
                    .iter()
                    .map(Self::from_yaml)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Yaml::Mapping(mapping) => {
                let mut entries = BTreeMap::new();
                for (key, value) in mapping {
                    let key = yaml_key(key)?;
                    if entries.insert(key.clone(), Self::from_yaml(value)?).is_some() {
                        return Err(ConfigurationError::SchemaValidation {
                            message: format!("Duplicate map key '{}'", key),
                        });
                    }
                }
                Self::Map(entries)
            }
            Yaml::Tagged(tagged) => {
                Self::Opaque(tagged.tag.to_string().trim_start_matches('!').to_string())
            }
        })
    }
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, ConfigurationError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(ConfigurationError::SchemaValidation {
            message: format!("Map keys must be scalars, got {:?}", other),
        }),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}
