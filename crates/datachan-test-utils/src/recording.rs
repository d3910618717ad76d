//! Recorders for channel notifications and channel messages.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use datachan_core::{ChannelListener, DataChannel};

/// Listener that records every channel opened by the peer.
///
/// Clones share the same record, so keep one clone for assertions and hand
/// the other to the manager.
#[derive(Clone, Default)]
pub struct RecordingListener {
    channels: Arc<Mutex<Vec<DataChannel>>>,
    notify: Arc<Notify>,
}

impl RecordingListener {
    /// Create an empty listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels seen so far, in notification order.
    pub fn channels(&self) -> Vec<DataChannel> {
        self.channels.lock().clone()
    }

    /// Number of notifications received.
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }

    /// Wait until at least `count` channels have been announced.
    pub async fn wait_for(&self, count: usize) -> Vec<DataChannel> {
        loop {
            let notified = self.notify.notified();
            {
                let channels = self.channels.lock();
                if channels.len() >= count {
                    return channels.clone();
                }
            }
            notified.await;
        }
    }
}

impl ChannelListener for RecordingListener {
    fn on_data_channel(&self, channel: DataChannel) {
        self.channels.lock().push(channel);
        self.notify.notify_waiters();
    }
}

/// Collects the text delivered to one channel.
#[derive(Clone, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<String>>>,
    notify: Arc<Notify>,
}

impl MessageLog {
    /// Register a log as an observer on `channel`.
    pub fn attach(channel: &DataChannel) -> Self {
        let log = Self::default();
        let sink = log.clone();
        channel.on_message(move |text| {
            sink.messages.lock().push(text.to_owned());
            sink.notify.notify_waiters();
        });
        log
    }

    /// Messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Wait until at least `count` messages have arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        loop {
            let notified = self.notify.notified();
            {
                let messages = self.messages.lock();
                if messages.len() >= count {
                    return messages.clone();
                }
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_listener_starts_empty() {
        let listener = RecordingListener::new();
        assert!(listener.is_empty());
        assert_eq!(listener.len(), 0);
        assert!(listener.channels().is_empty());
    }

    #[test]
    fn message_log_starts_empty() {
        assert!(MessageLog::default().messages().is_empty());
    }
}
