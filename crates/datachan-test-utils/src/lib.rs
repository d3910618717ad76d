//! datachan-test-utils: Test infrastructure for datachan.
//!
//! Provides:
//! - MockEndpoint: In-memory transport endpoint for testing without a network
//! - RecordingListener: Captures channels opened by the peer
//! - MessageLog: Captures text delivered to a channel

mod mock_transport;
mod recording;

pub use mock_transport::{MockEndpoint, SentMessage, mock_endpoint_pair};
pub use recording::{MessageLog, RecordingListener};
