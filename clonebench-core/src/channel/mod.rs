// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Channel pair abstraction.
//!
//! A channel hands structurally copied payloads from the orchestrating
//! context to a receiving context and delivers message events back to
//! attached listeners. Payloads are never shared by reference: every post
//! carries its own encoded copy.

mod listeners;
mod loopback;
mod worker;

use std::sync::Arc;

pub use listeners::{ChannelCloser, ListenerId, ListenerTable, Subscription};
pub use loopback::LoopbackChannel;
pub use worker::{WorkerChannel, WorkerMonitor};

use crate::codec;
use crate::error::{ConfigurationError, HarnessResult, MaterializationError};
use crate::types::Transport;
use crate::value::Value;

/// Forces full realization of a received value.
pub trait Materialize {
    /// Deep-decode the received copy into an owned value.
    fn materialize(&self) -> Result<Value, MaterializationError>;
}

/// Outbound dispatch plus one-shot inbound listeners.
pub trait Channel: Send {
    /// Event delivered to listeners.
    type Event: Materialize + Send + 'static;

    /// Hand a payload to the receiving context without waiting for delivery.
    fn send(&mut self, payload: &Value) -> HarnessResult<()>;

    /// Attach a listener for inbound events.
    fn subscribe(&mut self) -> HarnessResult<Subscription<Self::Event>>;

    /// Detach a listener previously returned by [`Channel::subscribe`].
    fn unsubscribe(&mut self, id: ListenerId);

    /// Number of currently attached listeners.
    fn listener_count(&self) -> usize;

    /// Handle for closing this channel while a session owns it.
    fn closer(&self) -> ChannelCloser;
}

/// One encoded, independently owned copy of a payload.
///
/// Clones share the immutable byte buffer; every [`Materialize::materialize`]
/// call decodes a fresh value from it.
#[derive(Debug, Clone)]
pub struct ClonedPayload {
    bytes: Arc<[u8]>,
}

impl ClonedPayload {
    /// Serialize a value into a new copy.
    pub fn encode(value: &Value) -> Result<Self, ConfigurationError> {
        Ok(Self::from_bytes(codec::encode(value)?))
    }

    /// Wrap already encoded bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Materialize for ClonedPayload {
    fn materialize(&self) -> Result<Value, MaterializationError> {
        codec::decode(&self.bytes)
    }
}

/// Event delivered to channel listeners.
#[derive(Debug, Clone)]
pub enum MessageEvent {
    /// A payload copy arrived.
    Message(ClonedPayload),
    /// The far side received a copy it could not deserialize.
    MessageError { reason: String },
}

impl Materialize for MessageEvent {
    fn materialize(&self) -> Result<Value, MaterializationError> {
        match self {
            Self::Message(payload) => payload.materialize(),
            Self::MessageError { reason } => Err(MaterializationError::ReceiverFailed {
                reason: reason.clone(),
            }),
        }
    }
}

/// The endpoint a session opens for itself.
pub enum Endpoint {
    Loopback(LoopbackChannel),
    Worker(WorkerChannel),
}

impl Endpoint {
    /// Open the primary (loopback) or the secondary (worker) endpoint.
    pub fn open(transport: Transport) -> HarnessResult<Self> {
        match transport {
            Transport::Loopback => Ok(Self::Loopback(LoopbackChannel::open()?)),
            Transport::Worker => Ok(Self::Worker(WorkerChannel::spawn()?)),
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Self::Loopback(_) => Transport::Loopback,
            Self::Worker(_) => Transport::Worker,
        }
    }
}

impl Channel for Endpoint {
    type Event = MessageEvent;

    fn send(&mut self, payload: &Value) -> HarnessResult<()> {
        match self {
            Self::Loopback(channel) => channel.send(payload),
            Self::Worker(channel) => channel.send(payload),
        }
    }

    fn subscribe(&mut self) -> HarnessResult<Subscription<MessageEvent>> {
        match self {
            Self::Loopback(channel) => channel.subscribe(),
            Self::Worker(channel) => channel.subscribe(),
        }
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        match self {
            Self::Loopback(channel) => channel.unsubscribe(id),
            Self::Worker(channel) => channel.unsubscribe(id),
        }
    }

    fn listener_count(&self) -> usize {
        match self {
            Self::Loopback(channel) => channel.listener_count(),
            Self::Worker(channel) => channel.listener_count(),
        }
    }

    fn closer(&self) -> ChannelCloser {
        match self {
            Self::Loopback(channel) => channel.closer(),
            Self::Worker(channel) => channel.closer(),
        }
    }
}
