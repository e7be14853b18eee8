// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Secondary endpoint: a dedicated worker thread.
//!
//! The worker materializes every copy it receives, re-encodes it and posts
//! it back to the listeners. A copy the worker cannot materialize comes back
//! as a `MessageError` event. The thread is joined when the channel drops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Handle, RuntimeFlavor};

use super::{
    Channel, ChannelCloser, ClonedPayload, ListenerId, ListenerTable, Materialize, MessageEvent,
    Subscription,
};
use crate::error::{HarnessError, HarnessResult};
use crate::value::Value;

const WORKER_THREAD_NAME: &str = "clonebench-worker";

pub struct WorkerChannel {
    inbox: Option<std_mpsc::Sender<ClonedPayload>>,
    listeners: ListenerTable<MessageEvent>,
    thread: Option<JoinHandle<u64>>,
    exited: Arc<AtomicBool>,
}

/// Observes whether a worker thread has left its echo loop.
#[derive(Debug, Clone)]
pub struct WorkerMonitor {
    exited: Arc<AtomicBool>,
}

impl WorkerMonitor {
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }
}

impl WorkerChannel {
    /// Start the worker thread.
    pub fn spawn() -> HarnessResult<Self> {
        let (inbox, rx) = std_mpsc::channel();
        let listeners = ListenerTable::new();
        let table = listeners.clone();
        let exited = Arc::new(AtomicBool::new(false));
        let exit_flag = exited.clone();

        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let echoed = echo_loop(rx, table);
                exit_flag.store(true, Ordering::Release);
                echoed
            })
            .map_err(|e| HarnessError::WorkerSpawn {
                reason: e.to_string(),
            })?;

        tracing::debug!(thread = WORKER_THREAD_NAME, "Worker endpoint spawned");

        Ok(Self {
            inbox: Some(inbox),
            listeners,
            thread: Some(thread),
            exited,
        })
    }

    /// Handle reporting when the worker thread has finished.
    pub fn monitor(&self) -> WorkerMonitor {
        WorkerMonitor {
            exited: self.exited.clone(),
        }
    }
}

/// Worker body. Returns the number of messages echoed.
fn echo_loop(rx: std_mpsc::Receiver<ClonedPayload>, listeners: ListenerTable<MessageEvent>) -> u64 {
    let mut echoed = 0;

    while let Ok(payload) = rx.recv() {
        if listeners.is_closed() {
            break;
        }

        let event = match payload.materialize() {
            Ok(value) => match ClonedPayload::encode(&value) {
                Ok(copy) => MessageEvent::Message(copy),
                Err(e) => MessageEvent::MessageError {
                    reason: e.to_string(),
                },
            },
            Err(e) => MessageEvent::MessageError {
                reason: e.to_string(),
            },
        };

        listeners.dispatch(event);
        echoed += 1;
    }

    echoed
}

impl Channel for WorkerChannel {
    type Event = MessageEvent;

    fn send(&mut self, payload: &Value) -> HarnessResult<()> {
        if self.listeners.is_closed() {
            return Err(HarnessError::closed("worker endpoint is closed"));
        }

        let copy = ClonedPayload::encode(payload)?;
        let inbox = self
            .inbox
            .as_ref()
            .ok_or_else(|| HarnessError::closed("worker endpoint torn down"))?;
        inbox
            .send(copy)
            .map_err(|_| HarnessError::closed("worker thread exited"))
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

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        self.listeners.close();
        // Dropping the inbox ends the worker's receive loop
        self.inbox.take();

        if let Some(thread) = self.thread.take() {
            // The worker finishes at most one in-flight copy before it sees
            // the closed inbox; keep a multi-thread runtime's other tasks
            // running while it does.
            let joined = match Handle::try_current().map(|h| h.runtime_flavor()) {
                Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| thread.join()),
                _ => thread.join(),
            };
            match joined {
                Ok(echoed) => tracing::debug!(echoed, "Worker endpoint torn down"),
                Err(_) => tracing::warn!("Worker thread panicked before teardown"),
            }
        }
    }
}
