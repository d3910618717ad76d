//! Wire codec for the channel open control message.
//!
//! Format (all integers big-endian):
//!
//! ```text
//!  0               1               2               3
//! +---------------+---------------+-------------------------------+
//! | message type  | channel type  |           priority            |
//! +---------------+---------------+-------------------------------+
//! |                    reliability parameter                      |
//! +-------------------------------+-------------------------------+
//! |         label length          |        protocol length        |
//! +-------------------------------+-------------------------------+
//! |                label (UTF-8) ... protocol (UTF-8) ...         |
//! +---------------------------------------------------------------+
//! ```
//!
//! Declared lengths are bounds-checked against the buffer; a message that
//! claims more bytes than it carries is rejected.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::constants::{MAX_NAME_LEN, MSG_TYPE_OPEN, OPEN_HEADER_LEN};
use crate::error::{Error, Result};
use crate::protocol::ChannelType;

/// A decoded channel open request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOpen {
    pub channel_type: ChannelType,
    pub priority: u16,
    pub reliability: u32,
    pub label: String,
    pub protocol: String,
}

impl ChannelOpen {
    /// Open request for a reliable, ordered channel.
    pub fn reliable(label: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            channel_type: ChannelType::Reliable,
            priority: 0,
            reliability: 0,
            label: label.into(),
            protocol: protocol.into(),
        }
    }

    /// Encode this open request to wire bytes.
    pub fn encode(&self) -> Result<Bytes> {
        let label_len = name_len("label", &self.label)?;
        let protocol_len = name_len("protocol", &self.protocol)?;

        let mut buf =
            BytesMut::with_capacity(OPEN_HEADER_LEN + self.label.len() + self.protocol.len());
        buf.put_u8(MSG_TYPE_OPEN);
        buf.put_u8(self.channel_type.as_u8());
        buf.put_u16(self.priority);
        buf.put_u32(self.reliability);
        buf.put_u16(label_len);
        buf.put_u16(protocol_len);
        buf.put_slice(self.label.as_bytes());
        buf.put_slice(self.protocol.as_bytes());

        Ok(buf.freeze())
    }

    /// Decode an open request from a complete control message.
    ///
    /// Bytes past the declared label and protocol are ignored.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < OPEN_HEADER_LEN {
            return Err(malformed(format!(
                "open message is {} bytes, header needs {}",
                data.len(),
                OPEN_HEADER_LEN
            )));
        }

        let mut buf = data;
        let msg_type = buf.get_u8();
        if msg_type != MSG_TYPE_OPEN {
            return Err(malformed(format!("unexpected message type {}", msg_type)));
        }
        let channel_type = ChannelType::from_u8(buf.get_u8());
        let priority = buf.get_u16();
        let reliability = buf.get_u32();
        let label_len = buf.get_u16() as usize;
        let protocol_len = buf.get_u16() as usize;

        if buf.remaining() < label_len + protocol_len {
            return Err(malformed(format!(
                "declared label ({}) and protocol ({}) lengths exceed {} remaining bytes",
                label_len,
                protocol_len,
                buf.remaining()
            )));
        }

        let label = utf8_field("label", &buf[..label_len])?;
        buf.advance(label_len);
        let protocol = utf8_field("protocol", &buf[..protocol_len])?;

        Ok(Self {
            channel_type,
            priority,
            reliability,
            label,
            protocol,
        })
    }
}

/// Encode an open request for a reliable channel.
pub fn encode_open(label: &str, protocol: &str) -> Result<Bytes> {
    ChannelOpen::reliable(label, protocol).encode()
}

/// Decode an open request.
pub fn decode_open(data: &[u8]) -> Result<ChannelOpen> {
    ChannelOpen::decode(data)
}

fn name_len(field: &str, value: &str) -> Result<u16> {
    if value.len() > MAX_NAME_LEN {
        return Err(Error::Codec {
            message: format!(
                "{} too long: {} bytes (max {})",
                field,
                value.len(),
                MAX_NAME_LEN
            ),
        });
    }
    Ok(value.len() as u16)
}

fn utf8_field(field: &str, bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| malformed(format!("{} is not valid UTF-8: {}", field, e)))
}

fn malformed(message: String) -> Error {
    Error::MalformedMessage { message }
}
