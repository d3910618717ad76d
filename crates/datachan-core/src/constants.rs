//! Protocol constants for the data channel establishment protocol.

// =============================================================================
// Payload Protocol Identifiers
// =============================================================================

/// Payload tag for channel establishment control messages.
pub const PPID_CONTROL: u16 = 50;

/// Payload tag for UTF-8 text data.
pub const PPID_STRING: u16 = 51;

// =============================================================================
// Control Message Layout
// =============================================================================

/// Message type byte of a channel open request.
pub const MSG_TYPE_OPEN: u8 = 3;

/// Channel type byte for reliable, ordered delivery.
pub const CHANNEL_TYPE_RELIABLE: u8 = 0;

/// Length of the fixed open message header.
pub const OPEN_HEADER_LEN: usize = 12;

/// Maximum byte length of a label or protocol name (u16 length field).
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

// =============================================================================
// Stream Id Allocation
// =============================================================================

/// Distance between two consecutive locally allocated stream ids.
pub const STREAM_ID_STEP: u16 = 2;
