//! Protocol module for the data channel wire format.
//!
//! This module provides:
//! - The channel open control message codec
//! - Payload protocol tag classification
//! - Stream id ownership by role

mod channel;
mod codec;

#[cfg(test)]
mod proptest;

pub use channel::*;
pub use codec::{ChannelOpen, decode_open, encode_open};
