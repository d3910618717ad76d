//! Stream id to channel registry.
//!
//! Owns the channel table of one manager together with the local id
//! counter, so allocation and insertion happen under the same lock.

use std::collections::HashMap;

use crate::channel::DataChannel;
use crate::constants::STREAM_ID_STEP;
use crate::error::{Error, Result};
use crate::protocol::Role;

/// Channel table with parity-based id allocation.
///
/// The local side allocates ids of its own parity; ids of the other parity
/// only enter the table when the peer opens a channel.
pub struct ChannelRegistry {
    channels: HashMap<u16, DataChannel>,
    /// Widened so running off the end of the id space is detectable.
    next_local_id: u32,
    role: Role,
}

impl ChannelRegistry {
    /// Create an empty registry for `role`.
    pub fn new(role: Role) -> Self {
        Self {
            channels: HashMap::new(),
            next_local_id: u32::from(role.first_stream_id()),
            role,
        }
    }

    /// Allocate the next local stream id.
    pub fn allocate_id(&mut self) -> Result<u16> {
        let id = u16::try_from(self.next_local_id).map_err(|_| Error::IdsExhausted)?;
        self.next_local_id += u32::from(STREAM_ID_STEP);
        Ok(id)
    }

    /// Give back the most recently allocated local id.
    ///
    /// Only valid before the id has been handed out or inserted.
    pub fn release_id(&mut self, id: u16) {
        if u32::from(id) + u32::from(STREAM_ID_STEP) == self.next_local_id {
            self.next_local_id = u32::from(id);
        }
    }

    /// Check that the peer may open a channel on `stream_id`.
    pub fn check_remote_id(&self, stream_id: u16) -> Result<()> {
        if self.role.owns(stream_id) {
            return Err(Error::ProtocolViolation {
                message: format!(
                    "peer opened stream {} which has {} parity",
                    stream_id, self.role
                ),
            });
        }
        if self.contains(stream_id) {
            return Err(Error::ProtocolViolation {
                message: format!("peer reopened existing stream {}", stream_id),
            });
        }
        Ok(())
    }

    /// Insert a channel under its own id.
    pub fn insert(&mut self, channel: DataChannel) {
        self.channels.insert(channel.id(), channel);
    }

    /// Get a clone of a channel handle by id.
    pub fn get(&self, stream_id: u16) -> Option<DataChannel> {
        self.channels.get(&stream_id).cloned()
    }

    /// Check if a channel exists.
    pub fn contains(&self, stream_id: u16) -> bool {
        self.channels.contains_key(&stream_id)
    }

    /// Get the number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Get all channel handles, ordered by stream id.
    pub fn channels(&self) -> Vec<DataChannel> {
        let mut channels: Vec<DataChannel> = self.channels.values().cloned().collect();
        channels.sort_by_key(DataChannel::id);
        channels
    }
}
