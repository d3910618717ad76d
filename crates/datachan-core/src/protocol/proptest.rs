//! Property-based tests for the open message codec.
//!
//! These tests use proptest to verify:
//! - Codec roundtrip for arbitrary labels and protocols
//! - Decoding never panics on arbitrary input
//! - Header length fields match the encoded payload

#![cfg(test)]

use proptest::prelude::*;

use crate::constants::OPEN_HEADER_LEN;
use crate::protocol::{ChannelOpen, ChannelType, decode_open, encode_open};

// =============================================================================
// Arbitrary Generators
// =============================================================================

prop_compose! {
    fn arb_open()(
        channel_type in any::<u8>(),
        priority in any::<u16>(),
        reliability in any::<u32>(),
        label in ".{0,64}",
        protocol in ".{0,64}",
    ) -> ChannelOpen {
        ChannelOpen {
            channel_type: ChannelType::from_u8(channel_type),
            priority,
            reliability,
            label,
            protocol,
        }
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn open_roundtrip(label in "\\PC{0,256}", protocol in "\\PC{0,256}") {
        let encoded = encode_open(&label, &protocol).unwrap();
        let decoded = decode_open(&encoded).unwrap();

        prop_assert_eq!(decoded.channel_type, ChannelType::Reliable);
        prop_assert_eq!(decoded.label, label);
        prop_assert_eq!(decoded.protocol, protocol);
    }

    #[test]
    fn open_roundtrip_all_fields(open in arb_open()) {
        let encoded = open.encode().unwrap();
        prop_assert_eq!(ChannelOpen::decode(&encoded).unwrap(), open);
    }

    #[test]
    fn header_lengths_match_payload(open in arb_open()) {
        let encoded = open.encode().unwrap();
        let label_len = u16::from_be_bytes([encoded[8], encoded[9]]) as usize;
        let protocol_len = u16::from_be_bytes([encoded[10], encoded[11]]) as usize;

        prop_assert_eq!(label_len, open.label.len());
        prop_assert_eq!(protocol_len, open.protocol.len());
        prop_assert_eq!(encoded.len(), OPEN_HEADER_LEN + label_len + protocol_len);
    }

    #[test]
    fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_open(&data);
    }

    #[test]
    fn decode_rejects_any_truncation(open in arb_open(), cut in 1usize..16) {
        let encoded = open.encode().unwrap();
        let keep = encoded.len().saturating_sub(cut);
        prop_assume!(keep < encoded.len());
        prop_assert!(decode_open(&encoded[..keep]).is_err());
    }
}
