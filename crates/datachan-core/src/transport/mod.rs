//! Transport abstractions for data channels.
//!
//! The manager runs over an already established, reliable, ordered,
//! message-oriented association (for example an SCTP association over DTLS).
//! Each delivery carries a stream id, a payload protocol tag and one complete
//! application message; framing and reassembly belong to the transport.

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

mod outbound;

pub(crate) use outbound::Outbound;
pub use outbound::SendCompletion;

// =============================================================================
// Inbound Message
// =============================================================================

/// One complete message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Transport stream the message arrived on.
    pub stream_id: u16,
    /// Payload protocol tag.
    pub ppid: u16,
    /// Message bytes.
    pub data: Bytes,
}

impl Inbound {
    /// Create an inbound message.
    pub fn new(stream_id: u16, ppid: u16, data: impl Into<Bytes>) -> Self {
        Self {
            stream_id,
            ppid,
            data: data.into(),
        }
    }
}

// =============================================================================
// Endpoint Trait
// =============================================================================

/// A message transport endpoint.
///
/// This trait abstracts over real associations and mock endpoints for testing.
/// The endpoint is shared between the receive loop and the outbound writer, so
/// both operations take `&self`.
pub trait Endpoint: Send + Sync + 'static {
    /// Whether this endpoint is the server side of the association.
    ///
    /// Read once, when a manager is constructed, to fix stream id parity.
    fn is_server(&self) -> bool;

    /// Send one message on `stream_id` tagged with `ppid`.
    fn send(&self, stream_id: u16, ppid: u16, data: Bytes)
    -> impl Future<Output = Result<()>> + Send;

    /// Receive the next complete message.
    fn recv(&self) -> impl Future<Output = Result<Inbound>> + Send;
}

// =============================================================================
// Tests
// =============================================================================
