//! Data channel manager: registry, open handshake and inbound dispatch.
//!
//! One manager runs per association. It owns the channel registry, sends
//! open requests for locally created channels, and classifies every inbound
//! transport message:
//!
//! ```text
//! ppid 50 (control) ── OPEN ──> register channel, notify listener
//!                  └── other ─> ignored
//! ppid 51 (string)  ── known stream ─> deliver text to channel observers
//!                  └── unknown ─────> ignored
//! anything else ───────────────────> ignored
//! ```
//!
//! Errors in a single message never stop the dispatch loop; only a failing
//! transport receive does.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::channel::{DataChannel, send_text};
use crate::config::ManagerConfig;
use crate::constants::{MSG_TYPE_OPEN, PPID_CONTROL};
use crate::error::{Error, Result};
use crate::protocol::{ChannelOpen, ChannelType, PayloadProtocol, Role};
use crate::registry::ChannelRegistry;
use crate::transport::{Endpoint, Inbound, Outbound, SendCompletion};

// =============================================================================
// Listener
// =============================================================================

/// Receives channels opened by the peer.
///
/// Called synchronously from the dispatch loop, once per accepted open
/// request, after the channel is registered.
pub trait ChannelListener: Send + Sync {
    /// A new incoming data channel was opened by the peer.
    fn on_data_channel(&self, channel: DataChannel);
}

impl<F> ChannelListener for F
where
    F: Fn(DataChannel) + Send + Sync,
{
    fn on_data_channel(&self, channel: DataChannel) {
        self(channel)
    }
}

// =============================================================================
// Dispatch Outcome
// =============================================================================

/// What a single dispatch step did with an inbound message.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// The peer opened a channel; it is registered and the listener was told.
    Opened(DataChannel),
    /// Text was delivered to the observers of `stream_id`.
    Delivered { stream_id: u16 },
    /// The message was not routable and was dropped.
    Ignored,
}

// =============================================================================
// Manager
// =============================================================================

/// Establishes and multiplexes data channels over one transport endpoint.
///
/// Share it behind an `Arc` to open channels from one task while another
/// drives [`run`](Self::run).
pub struct DataChannelManager<E: Endpoint> {
    endpoint: Arc<E>,
    role: Role,
    /// Channel table and local id counter, guarded together.
    registry: Mutex<ChannelRegistry>,
    outbound: Outbound,
    listener: Arc<dyn ChannelListener>,
}

impl<E: Endpoint> DataChannelManager<E> {
    /// Create a manager with default configuration.
    ///
    /// Spawns the outbound writer task, so this must be called from within a
    /// tokio runtime.
    pub fn new<L>(endpoint: Arc<E>, listener: L) -> Self
    where
        L: ChannelListener + 'static,
    {
        Self::with_config(endpoint, listener, ManagerConfig::default())
    }

    /// Create a manager with explicit configuration.
    pub fn with_config<L>(endpoint: Arc<E>, listener: L, config: ManagerConfig) -> Self
    where
        L: ChannelListener + 'static,
    {
        let role = config.resolve_role(endpoint.is_server());
        let outbound = Outbound::spawn(endpoint.clone(), config.outbound_capacity);
        debug!(
            %role,
            outbound_capacity = ?config.outbound_capacity,
            "Data channel manager created"
        );

        Self {
            endpoint,
            role,
            registry: Mutex::new(ChannelRegistry::new(role)),
            outbound,
            listener: Arc::new(listener),
        }
    }

    /// The local role, which fixes the parity of locally allocated ids.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Open a new channel.
    ///
    /// The channel is registered and returned immediately; the open request
    /// is queued for the transport and the channel is usable for sending
    /// right away, without waiting for the peer.
    ///
    /// Fails with [`Error::QueueFull`] if a bounded outbound queue has no
    /// room for the open request, in which case nothing is registered.
    pub fn open_channel(&self, label: &str, protocol: &str) -> Result<DataChannel> {
        // Encode first so an oversized name doesn't burn an id
        let open = ChannelOpen::reliable(label, protocol).encode()?;

        let channel = {
            let mut registry = self.registry.lock();
            let id = registry.allocate_id()?;
            // Queue under the lock so opens reach the transport in id order
            if let Err(e) = self.outbound.try_submit(id, PPID_CONTROL, open) {
                registry.release_id(id);
                warn!(id, label, error = %e, "Open request not queued");
                return Err(e);
            }
            let channel = DataChannel::new(
                id,
                label.to_owned(),
                protocol.to_owned(),
                self.outbound.clone(),
            );
            registry.insert(channel.clone());
            channel
        };

        info!(id = channel.id(), label, protocol, "Opening data channel");
        Ok(channel)
    }

    /// Queue a text message on `channel`.
    ///
    /// The returned completion may be awaited or dropped.
    pub fn send(&self, channel: &DataChannel, text: &str) -> SendCompletion {
        send_text(&self.outbound, channel.id(), text)
    }

    /// Look up a registered channel.
    pub fn channel(&self, stream_id: u16) -> Option<DataChannel> {
        self.registry.lock().get(stream_id)
    }

    /// All registered channels, ordered by stream id.
    pub fn channels(&self) -> Vec<DataChannel> {
        self.registry.lock().channels()
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    /// Check if no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Receive and dispatch transport messages until the transport fails.
    ///
    /// Per-message errors are logged and the message dropped. The returned
    /// error is always the transport's receive failure.
    pub async fn run(&self) -> Result<()> {
        info!(role = %self.role, "Data channel dispatch loop started");
        loop {
            let msg = match self.endpoint.recv().await {
                Ok(msg) => msg,
                Err(e) => {
                    info!(error = %e, "Transport receive failed, dispatch loop exiting");
                    return Err(e);
                }
            };

            let stream_id = msg.stream_id;
            let ppid = msg.ppid;
            if let Err(e) = self.dispatch(msg) {
                match e {
                    Error::ProtocolViolation { .. } => {
                        warn!(stream_id, error = %e, "Dropping control message")
                    }
                    _ => debug!(stream_id, ppid, error = %e, "Dropping message"),
                }
            }
        }
    }

    /// Classify and route one inbound message.
    ///
    /// Errors are confined to this message; the registry is unchanged when
    /// an error is returned.
    pub fn dispatch(&self, msg: Inbound) -> Result<Dispatch> {
        match PayloadProtocol::from_u16(msg.ppid) {
            Some(PayloadProtocol::Control) => self.handle_control(msg.stream_id, &msg.data),
            Some(PayloadProtocol::String) => self.handle_string(msg.stream_id, &msg.data),
            None => {
                trace!(stream_id = msg.stream_id, ppid = msg.ppid, "Unknown payload protocol");
                Ok(Dispatch::Ignored)
            }
        }
    }

    fn handle_control(&self, stream_id: u16, data: &[u8]) -> Result<Dispatch> {
        if data.first() != Some(&MSG_TYPE_OPEN) {
            trace!(stream_id, len = data.len(), "Ignoring non-open control message");
            return Ok(Dispatch::Ignored);
        }

        let open = ChannelOpen::decode(data)?;
        if let ChannelType::Unsupported(kind) = open.channel_type {
            debug!(
                stream_id,
                channel_type = kind,
                "Peer requested unsupported channel type, treating as reliable"
            );
        }

        let channel = {
            let mut registry = self.registry.lock();
            registry.check_remote_id(stream_id)?;
            let channel = DataChannel::new(
                stream_id,
                open.label,
                open.protocol,
                self.outbound.clone(),
            );
            registry.insert(channel.clone());
            channel
        };

        info!(
            id = stream_id,
            label = channel.label(),
            protocol = channel.protocol(),
            "Peer opened data channel"
        );
        self.listener.on_data_channel(channel.clone());

        Ok(Dispatch::Opened(channel))
    }

    fn handle_string(&self, stream_id: u16, data: &[u8]) -> Result<Dispatch> {
        let Some(channel) = self.channel(stream_id) else {
            trace!(stream_id, "Data for unknown stream");
            return Ok(Dispatch::Ignored);
        };

        let text = std::str::from_utf8(data)?;
        channel.deliver(text);

        Ok(Dispatch::Delivered { stream_id })
    }
}

impl<E: Endpoint> std::fmt::Debug for DataChannelManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataChannelManager")
            .field("role", &self.role)
            .field("channels", &self.len())
            .finish_non_exhaustive()
    }
}
