//! Data channel handle.
//!
//! A `DataChannel` is a cheap, cloneable reference to one established
//! channel. Identity (`id`, `label`, `protocol`) is fixed at creation; the
//! list of message observers is the only mutable state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::trace;

use crate::constants::PPID_STRING;
use crate::transport::{Outbound, SendCompletion};

/// Callback invoked with each text message delivered to a channel.
pub type MessageObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Token returned by [`DataChannel::on_message`], used to remove the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Handle to one established data channel.
#[derive(Clone)]
pub struct DataChannel {
    inner: Arc<DataChannelInner>,
}

struct DataChannelInner {
    /// Transport stream id.
    id: u16,
    /// Channel label (not required to be unique).
    label: String,
    /// Subprotocol name.
    protocol: String,
    /// Shared outbound queue of the owning manager.
    outbound: Outbound,
    /// Observers in registration order.
    observers: Mutex<Vec<(ObserverId, MessageObserver)>>,
    next_observer: AtomicU64,
}

impl DataChannel {
    pub(crate) fn new(id: u16, label: String, protocol: String, outbound: Outbound) -> Self {
        Self {
            inner: Arc::new(DataChannelInner {
                id,
                label,
                protocol,
                outbound,
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(0),
            }),
        }
    }

    /// Stream id that uniquely identifies this channel within its manager.
    pub fn id(&self) -> u16 {
        self.inner.id
    }

    /// A name describing the channel. Labels are not required to be unique.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The name of the subprotocol in use.
    pub fn protocol(&self) -> &str {
        &self.inner.protocol
    }

    /// Queue a text message on this channel.
    ///
    /// Returns immediately. The completion may be awaited for the transport
    /// result or dropped.
    pub fn send(&self, text: &str) -> SendCompletion {
        send_text(&self.inner.outbound, self.inner.id, text)
    }

    /// Register an observer for inbound text messages.
    ///
    /// Observers run synchronously on the dispatch loop, in registration
    /// order, and should not block.
    pub fn on_message<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        let observer: MessageObserver = Arc::new(observer);
        self.inner.observers.lock().push((id, observer));
        id
    }

    /// Remove a previously registered observer.
    ///
    /// Returns true if the observer was found.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.lock();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Close the channel.
    ///
    /// Channels live for the lifetime of the association: this sends nothing
    /// and leaves the channel registered.
    pub fn close(&self) {
        trace!(id = self.inner.id, label = %self.inner.label, "Close requested, ignoring");
    }

    /// Hand an inbound message to every observer.
    pub(crate) fn deliver(&self, text: &str) {
        // Snapshot so observers can (un)register without deadlocking
        let observers: Vec<MessageObserver> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in observers {
            observer(text);
        }
    }

    /// Check if two handles refer to the same channel.
    pub fn ptr_eq(&self, other: &DataChannel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

pub(crate) fn send_text(outbound: &Outbound, stream_id: u16, text: &str) -> SendCompletion {
    outbound.submit(stream_id, PPID_STRING, Bytes::copy_from_slice(text.as_bytes()))
}

impl std::fmt::Debug for DataChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataChannel")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("protocol", &self.inner.protocol)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for DataChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.inner.label, self.inner.id)
    }
}
