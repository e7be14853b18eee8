// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Primary endpoint: the orchestrating context posting to itself.
//!
//! `send` encodes the payload and enqueues it; a pump task on the current
//! tokio runtime delivers each queued copy to the listeners as a message
//! event, so delivery always happens after `send` has returned.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{
    Channel, ChannelCloser, ClonedPayload, ListenerId, ListenerTable, MessageEvent, Subscription,
};
use crate::error::{HarnessError, HarnessResult};
use crate::value::Value;

pub struct LoopbackChannel {
    queue: mpsc::UnboundedSender<ClonedPayload>,
    listeners: ListenerTable<MessageEvent>,
    pump: JoinHandle<()>,
}

impl LoopbackChannel {
    /// Open a loopback endpoint on the current tokio runtime.
    ///
    /// Fails with `RuntimeUnavailable` outside a runtime.
    pub fn open() -> HarnessResult<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            HarnessError::RuntimeUnavailable {
                reason: e.to_string(),
            }
        })?;

        let (queue, mut inbox) = mpsc::unbounded_channel::<ClonedPayload>();
        let listeners = ListenerTable::new();
        let table = listeners.clone();

        let pump = runtime.spawn(async move {
            while let Some(payload) = inbox.recv().await {
                table.dispatch(MessageEvent::Message(payload));
            }
        });

        tracing::debug!("Loopback endpoint opened");

        Ok(Self {
            queue,
            listeners,
            pump,
        })
    }
}

impl Channel for LoopbackChannel {
    type Event = MessageEvent;

    fn send(&mut self, payload: &Value) -> HarnessResult<()> {
        if self.listeners.is_closed() {
            return Err(HarnessError::closed("loopback endpoint is closed"));
        }

        let copy = ClonedPayload::encode(payload)?;
        self.queue
            .send(copy)
            .map_err(|_| HarnessError::closed("loopback pump stopped"))
    }

    fn subscribe(&mut self) -> HarnessResult<Subscription<MessageEvent>> {
        self.listeners.subscribe()
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn closer(&self) -> ChannelCloser {
        self.listeners.closer()
    }
}

impl Drop for LoopbackChannel {
    fn drop(&mut self) {
        self.listeners.close();
        self.pump.abort();
        tracing::debug!("Loopback endpoint closed");
    }
}
