// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Listener registry shared by every endpoint.
//!
//! Endpoints deliver inbound events to whatever listeners are attached at
//! dispatch time. The registry is written from the orchestrating task and
//! read from delivery contexts (pump task or worker thread), hence the
//! concurrent map.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::{HarnessError, HarnessResult};

/// Identifier of one attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Receiving half of an attached listener.
///
/// Waiting on a subscription whose endpoint has been closed yields `None`.
#[derive(Debug)]
pub struct Subscription<E> {
    id: ListenerId,
    events: mpsc::UnboundedReceiver<E>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next event delivered to this listener.
    pub async fn recv(&mut self) -> Option<E> {
        self.events.recv().await
    }
}

struct Listeners<E> {
    next_id: AtomicU64,
    entries: DashMap<ListenerId, mpsc::UnboundedSender<E>>,
    closed: AtomicBool,
}

/// Concurrent table of attached listeners.
pub struct ListenerTable<E> {
    inner: Arc<Listeners<E>>,
}

impl<E> Clone for ListenerTable<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Clone + Send + 'static> ListenerTable<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Listeners {
                next_id: AtomicU64::new(1),
                entries: DashMap::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Attach a new listener.
    ///
    /// Fails with `ChannelClosed` once the table has been closed.
    pub fn subscribe(&self) -> HarnessResult<Subscription<E>> {
        if self.is_closed() {
            return Err(HarnessError::closed("cannot subscribe to a closed endpoint"));
        }

        let (tx, events) = mpsc::unbounded_channel();
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.entries.insert(id, tx);

        // close() may have raced with the insert
        if self.is_closed() {
            self.inner.entries.remove(&id);
            return Err(HarnessError::closed("endpoint closed while subscribing"));
        }

        Ok(Subscription { id, events })
    }

    /// Detach a listener. Returns false if it was not attached.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.entries.remove(&id).is_some()
    }

    /// Number of attached listeners.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Deliver an event to every attached listener.
    ///
    /// Listeners whose receiving half was dropped are pruned.
    /// Returns the number of listeners reached.
    pub fn dispatch(&self, event: E) -> usize {
        if self.is_closed() {
            return 0;
        }

        let mut delivered = 0;
        let mut stale = Vec::new();
        for entry in self.inner.entries.iter() {
            if entry.value().send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                stale.push(*entry.key());
            }
        }

        for id in stale {
            self.inner.entries.remove(&id);
        }

        delivered
    }

    /// Close the table: detach everyone and refuse new listeners.
    ///
    /// Pending `Subscription::recv` calls resolve to `None`.
    pub fn close(&self) {
        CloseSignal::close(&*self.inner);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Handle that lets a caller close this table from elsewhere.
    pub fn closer(&self) -> ChannelCloser {
        ChannelCloser {
            target: self.inner.clone(),
        }
    }
}

impl<E: Clone + Send + 'static> Default for ListenerTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

trait CloseSignal: Send + Sync {
    fn close(&self);
    fn is_closed(&self) -> bool;
}

impl<E: Send + 'static> CloseSignal for Listeners<E> {
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Cancellation handle for a channel owned by a running session.
///
/// Closing makes the in-flight trial fail with `ChannelClosed` instead of
/// waiting forever.
#[derive(Clone)]
pub struct ChannelCloser {
    target: Arc<dyn CloseSignal>,
}

impl ChannelCloser {
    pub fn close(&self) {
        tracing::debug!("Channel closed by caller");
        self.target.close();
    }

    pub fn is_closed(&self) -> bool {
        self.target.is_closed()
    }
}

impl fmt::Debug for ChannelCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelCloser")
            .field("closed", &self.is_closed())
            .finish()
    }
}
