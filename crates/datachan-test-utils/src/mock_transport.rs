//! Mock transport endpoint for testing without a real association.
//!
//! Provides in-memory endpoints that implement [`Endpoint`], allowing the
//! manager and dispatch logic to be tested without SCTP or DTLS. Every sent
//! message is recorded; endpoints created as a pair also deliver to the peer.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc, watch};

use datachan_core::error::{Error, Result};
use datachan_core::transport::{Endpoint, Inbound};

/// One message handed to [`MockEndpoint::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub stream_id: u16,
    pub ppid: u16,
    pub data: Bytes,
}

impl SentMessage {
    /// Payload as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// An in-memory transport endpoint.
#[derive(Debug)]
pub struct MockEndpoint {
    is_server: bool,
    /// Everything sent through this endpoint, in order.
    sent: Mutex<Vec<SentMessage>>,
    sent_notify: Notify,
    /// Our own inbound queue, fed by `inject` and by the peer.
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: AsyncMutex<mpsc::UnboundedReceiver<Inbound>>,
    /// Peer's inbound queue, when wired as a pair.
    peer_tx: Option<mpsc::UnboundedSender<Inbound>>,
    closed: watch::Sender<bool>,
}

impl MockEndpoint {
    fn build(
        is_server: bool,
        inbound: (mpsc::UnboundedSender<Inbound>, mpsc::UnboundedReceiver<Inbound>),
        peer_tx: Option<mpsc::UnboundedSender<Inbound>>,
    ) -> Arc<Self> {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            is_server,
            sent: Mutex::new(Vec::new()),
            sent_notify: Notify::new(),
            inbound_tx: inbound.0,
            inbound_rx: AsyncMutex::new(inbound.1),
            peer_tx,
            closed,
        })
    }

    /// Create a standalone endpoint that only records sends.
    pub fn new(is_server: bool) -> Arc<Self> {
        Self::build(is_server, mpsc::unbounded_channel(), None)
    }

    /// Queue a message for our own `recv`.
    pub fn inject(&self, msg: Inbound) {
        let _ = self.inbound_tx.send(msg);
    }

    /// Snapshot of all sent messages.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Number of sent messages.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Wait until at least `count` messages have been sent.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<SentMessage> {
        loop {
            let notified = self.sent_notify.notified();
            {
                let sent = self.sent.lock();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            notified.await;
        }
    }

    /// Simulate the association going away.
    ///
    /// Pending and future `recv` calls fail, as do further sends.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Check if the endpoint is closed.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Endpoint for MockEndpoint {
    fn is_server(&self) -> bool {
        self.is_server
    }

    async fn send(&self, stream_id: u16, ppid: u16, data: Bytes) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        if let Some(peer) = &self.peer_tx {
            peer.send(Inbound::new(stream_id, ppid, data.clone()))
                .map_err(|_| Error::ConnectionClosed)?;
        }

        self.sent.lock().push(SentMessage {
            stream_id,
            ppid,
            data,
        });
        self.sent_notify.notify_waiters();
        Ok(())
    }

    async fn recv(&self) -> Result<Inbound> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(Error::ConnectionClosed);
        }

        let mut rx = self.inbound_rx.lock().await;
        tokio::select! {
            msg = rx.recv() => msg.ok_or(Error::ConnectionClosed),
            _ = closed.wait_for(|closed| *closed) => Err(Error::ConnectionClosed),
        }
    }
}

/// Create a pair of wired endpoints: `(server, client)`.
///
/// Whatever one side sends, the other receives.
pub fn mock_endpoint_pair() -> (Arc<MockEndpoint>, Arc<MockEndpoint>) {
    let (server_tx, server_rx) = mpsc::unbounded_channel();
    let (client_tx, client_rx) = mpsc::unbounded_channel();

    let server = MockEndpoint::build(
        true,
        (server_tx.clone(), server_rx),
        Some(client_tx.clone()),
    );
    let client = MockEndpoint::build(false, (client_tx, client_rx), Some(server_tx));

    (server, client)
}

// =============================================================================
// Tests
// =============================================================================
