//! Stream id ownership and channel type definitions.
//!
//! This module provides:
//! - Role discrimination (which side allocates even vs odd stream ids)
//! - Channel type byte mapping for open messages
//! - Payload protocol tag classification

use serde::{Deserialize, Serialize};

use crate::constants::{CHANNEL_TYPE_RELIABLE, PPID_CONTROL, PPID_STRING};

// =============================================================================
// Role
// =============================================================================

/// Which side of the association this manager is.
///
/// Both sides open channels. To avoid collisions each side allocates stream
/// ids from its own parity class:
/// - Server allocates even ids `0, 2, 4, ...`
/// - Client allocates odd ids `1, 3, 5, ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Even allocator.
    Server,
    /// Odd allocator.
    Client,
}

impl Role {
    /// Role for an endpoint that reports `is_server`.
    pub fn from_is_server(is_server: bool) -> Self {
        if is_server { Role::Server } else { Role::Client }
    }

    /// First stream id this role allocates.
    pub fn first_stream_id(self) -> u16 {
        match self {
            Role::Server => 0,
            Role::Client => 1,
        }
    }

    /// Check if `stream_id` belongs to this role's parity class.
    pub fn owns(self, stream_id: u16) -> bool {
        stream_id % 2 == self.first_stream_id()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}

// =============================================================================
// Channel Types
// =============================================================================

/// Delivery semantics requested in an open message.
///
/// Only reliable, ordered channels are produced locally. Other values are
/// carried through from the wire so callers can see what the peer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// Reliable, ordered delivery.
    Reliable,
    /// Any channel type byte this implementation does not support.
    Unsupported(u8),
}

impl ChannelType {
    /// Map a wire byte to a channel type.
    pub fn from_u8(value: u8) -> Self {
        match value {
            CHANNEL_TYPE_RELIABLE => ChannelType::Reliable,
            other => ChannelType::Unsupported(other),
        }
    }

    /// Wire byte for this channel type.
    pub fn as_u8(self) -> u8 {
        match self {
            ChannelType::Reliable => CHANNEL_TYPE_RELIABLE,
            ChannelType::Unsupported(value) => value,
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Reliable => write!(f, "reliable"),
            ChannelType::Unsupported(value) => write!(f, "unsupported({:#04x})", value),
        }
    }
}

// =============================================================================
// Payload Protocol
// =============================================================================

/// Payload tag distinguishing control traffic from text data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadProtocol {
    /// Channel establishment control message.
    Control,
    /// UTF-8 text message.
    String,
}

impl PayloadProtocol {
    /// Classify a payload tag. Unknown tags return `None`.
    pub fn from_u16(ppid: u16) -> Option<Self> {
        match ppid {
            PPID_CONTROL => Some(PayloadProtocol::Control),
            PPID_STRING => Some(PayloadProtocol::String),
            _ => None,
        }
    }
}
