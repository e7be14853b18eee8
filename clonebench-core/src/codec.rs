// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Structured-clone wire codec.
//!
//! Every post across a channel encodes the payload into an independent byte
//! copy; the receiving side decodes it back into a fresh [`Value`]. Decoding
//! is the materialization step the harness times.
//!
//! Layout:
//!
//! ```text
//! +---------+----------+-------------+-----------+------------------+
//! | version | reserved | body_len LE | crc32 LE  | body (tag tree)  |
//! |   u8    |  3 bytes |     u32     |    u32    |   body_len bytes |
//! +---------+----------+-------------+-----------+------------------+
//! ```

use std::collections::BTreeMap;

use crate::error::{ConfigurationError, MaterializationError};
use crate::value::Value;

/// Current wire version.
pub const WIRE_VERSION: u8 = 1;

/// Envelope header size in bytes.
pub const HEADER_SIZE: usize = 12;

/// Maximum encoded payload size (16 MB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Maximum nesting depth of arrays and maps.
pub const MAX_DEPTH: usize = 64;

const TAG_NULL: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STRING: u8 = 0x05;
const TAG_BYTES: u8 = 0x06;
const TAG_ARRAY: u8 = 0x07;
const TAG_MAP: u8 = 0x08;

/// Encode a value into a self-checking envelope.
///
/// Fails with [`ConfigurationError::NotTransmissible`] for opaque nodes,
/// [`ConfigurationError::DepthExceeded`] past [`MAX_DEPTH`], and
/// [`ConfigurationError::PayloadTooLarge`] past [`MAX_PAYLOAD_SIZE`].
pub fn encode(value: &Value) -> Result<Vec<u8>, ConfigurationError> {
    let mut out = vec![0u8; HEADER_SIZE];
    write_value(&mut out, value, 0).map_err(EncodeFault::into_error)?;

    let body_len = out.len() - HEADER_SIZE;
    if out.len() > MAX_PAYLOAD_SIZE {
        return Err(ConfigurationError::PayloadTooLarge {
            size: out.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let checksum = crc32fast::hash(&out[HEADER_SIZE..]);
    out[0] = WIRE_VERSION;
    out[4..8].copy_from_slice(&(body_len as u32).to_le_bytes());
    out[8..12].copy_from_slice(&checksum.to_le_bytes());

    Ok(out)
}

/// Decode an envelope back into a fully materialized value.
pub fn decode(bytes: &[u8]) -> Result<Value, MaterializationError> {
    if bytes.len() < HEADER_SIZE {
        return Err(MaterializationError::Truncated {
            offset: 0,
            needed: HEADER_SIZE,
        });
    }

    let version = bytes[0];
    if version != WIRE_VERSION {
        return Err(MaterializationError::UnsupportedVersion { version });
    }

    let declared = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let body = &bytes[HEADER_SIZE..];
    if declared != body.len() {
        return Err(MaterializationError::LengthMismatch {
            declared,
            actual: body.len(),
        });
    }

    // Validate checksum - fail immediately on mismatch
    let expected = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let actual = crc32fast::hash(body);
    if actual != expected {
        return Err(MaterializationError::ChecksumMismatch { expected, actual });
    }

    let mut reader = Reader {
        bytes,
        pos: HEADER_SIZE,
    };
    let value = reader.read_value(0)?;

    let trailing = bytes.len() - reader.pos;
    if trailing > 0 {
        return Err(MaterializationError::TrailingBytes { count: trailing });
    }

    Ok(value)
}

/// Encoding failure with the path collected while unwinding.
struct EncodeFault {
    /// Innermost segment first.
    segments: Vec<String>,
    kind: FaultKind,
}

enum FaultKind {
    Opaque(String),
    TooDeep,
    TooLarge(usize),
}

impl EncodeFault {
    fn new(kind: FaultKind) -> Self {
        Self {
            segments: Vec::new(),
            kind,
        }
    }

    fn within(mut self, segment: String) -> Self {
        self.segments.push(segment);
        self
    }

    fn into_error(self) -> ConfigurationError {
        let path = std::iter::once("$".to_string())
            .chain(self.segments.into_iter().rev())
            .collect::<String>();

        match self.kind {
            FaultKind::Opaque(kind) => ConfigurationError::NotTransmissible { path, kind },
            FaultKind::TooDeep => ConfigurationError::DepthExceeded {
                path,
                max: MAX_DEPTH,
            },
            FaultKind::TooLarge(size) => ConfigurationError::PayloadTooLarge {
                size,
                max: MAX_PAYLOAD_SIZE,
            },
        }
    }
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<(), EncodeFault> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(EncodeFault::new(FaultKind::TooLarge(len)));
    }
    out.extend_from_slice(&(len as u32).to_le_bytes());
    Ok(())
}

fn write_str(out: &mut Vec<u8>, s: &str) -> Result<(), EncodeFault> {
    write_len(out, s.len())?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_value(out: &mut Vec<u8>, value: &Value, depth: usize) -> Result<(), EncodeFault> {
    if out.len() > MAX_PAYLOAD_SIZE {
        return Err(EncodeFault::new(FaultKind::TooLarge(out.len())));
    }

    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Int(i) => {
            out.push(TAG_INT);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float(f) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&f.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            out.push(TAG_STRING);
            write_str(out, s)?;
        }
        Value::Bytes(b) => {
            out.push(TAG_BYTES);
            write_len(out, b.len())?;
            out.extend_from_slice(b);
        }
        Value::Array(items) => {
            if depth >= MAX_DEPTH {
                return Err(EncodeFault::new(FaultKind::TooDeep));
            }
            out.push(TAG_ARRAY);
            write_len(out, items.len())?;
            for (index, item) in items.iter().enumerate() {
                write_value(out, item, depth + 1).map_err(|f| f.within(format!("[{}]", index)))?;
            }
        }
        Value::Map(entries) => {
            if depth >= MAX_DEPTH {
                return Err(EncodeFault::new(FaultKind::TooDeep));
            }
            out.push(TAG_MAP);
            write_len(out, entries.len())?;
            for (key, item) in entries {
                write_str(out, key)?;
                write_value(out, item, depth + 1).map_err(|f| f.within(format!(".{}", key)))?;
            }
        }
        Value::Opaque(kind) => return Err(EncodeFault::new(FaultKind::Opaque(kind.clone()))),
    }

    Ok(())
}

/// Cursor over an envelope being decoded.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], MaterializationError> {
        if self.bytes.len() - self.pos < n {
            return Err(MaterializationError::Truncated {
                offset: self.pos,
                needed: n,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, MaterializationError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<usize, MaterializationError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
    }

    fn read_u64(&mut self) -> Result<u64, MaterializationError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_le_bytes(raw))
    }

    fn read_string(&mut self) -> Result<String, MaterializationError> {
        let len = self.read_u32()?;
        let offset = self.pos;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| MaterializationError::InvalidUtf8 { offset })
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, MaterializationError> {
        let offset = self.pos;
        let tag = self.read_u8()?;

        Ok(match tag {
            TAG_NULL => Value::Null,
            TAG_FALSE => Value::Bool(false),
            TAG_TRUE => Value::Bool(true),
            TAG_INT => Value::Int(self.read_u64()? as i64),
            TAG_FLOAT => Value::Float(f64::from_bits(self.read_u64()?)),
            TAG_STRING => Value::String(self.read_string()?),
            TAG_BYTES => {
                let len = self.read_u32()?;
                Value::Bytes(self.take(len)?.to_vec())
            }
            TAG_ARRAY => {
                if depth >= MAX_DEPTH {
                    return Err(MaterializationError::DepthExceeded {
                        offset,
                        max: MAX_DEPTH,
                    });
                }
                let count = self.read_u32()?;
                // Never trust the declared count for preallocation
                let mut items = Vec::with_capacity(count.min(self.bytes.len() - self.pos));
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                Value::Array(items)
            }
            TAG_MAP => {
                if depth >= MAX_DEPTH {
                    return Err(MaterializationError::DepthExceeded {
                        offset,
                        max: MAX_DEPTH,
                    });
                }
                let count = self.read_u32()?;
                let mut entries = BTreeMap::new();
                for _ in 0..count {
                    let key = self.read_string()?;
                    let item = self.read_value(depth + 1)?;
                    entries.insert(key, item);
                }
                Value::Map(entries)
            }
            other => return Err(MaterializationError::UnknownTag { tag: other, offset }),
        })
    }
}
