//! datachan-core: Data channel establishment and multiplexing.
//!
//! This crate provides:
//! - The channel open control message codec
//! - Parity-based stream id allocation between the two peers
//! - A registry mapping stream ids to channel handles
//! - The dispatch loop routing inbound transport messages
//! - Transport endpoint abstraction
//! - Logging setup

pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod manager;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use channel::{DataChannel, MessageObserver, ObserverId};
pub use config::ManagerConfig;
pub use error::{Error, Result};
pub use logging::{LogFormat, init_logging};
pub use manager::{ChannelListener, DataChannelManager, Dispatch};
pub use protocol::Role;
pub use transport::{Endpoint, Inbound, SendCompletion};
