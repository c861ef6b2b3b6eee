//! Payload hashing.

use objsign_core::hash::hex_sha256;
use objsign_core::Payload;

use crate::constants::EMPTY_STRING_SHA256;
use crate::constants::UNSIGNED_PAYLOAD;

/// Compute the payload hash line of the canonical request.
///
/// Bodies that are absent hash to the well-known digest of zero bytes, and
/// streamed bodies resolve to the `UNSIGNED-PAYLOAD` sentinel instead of a
/// digest.
pub fn payload_hash(payload: &Payload) -> String {
    match payload {
        Payload::Empty => EMPTY_STRING_SHA256.to_string(),
        Payload::Bytes(bs) => hex_sha256(bs),
        Payload::UnsignedStreaming => UNSIGNED_PAYLOAD.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_payload_constant() {
        assert_eq!(
            payload_hash(&Payload::Empty),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_zero_length_bytes_match_empty() {
        assert_eq!(
            payload_hash(&Payload::Bytes(Bytes::new())),
            payload_hash(&Payload::Empty)
        );
    }

    #[test]
    fn test_bytes_digest_is_lowercase_hex() {
        let hash = payload_hash(&Payload::Bytes(Bytes::from_static(b"Hello,World!")));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash.to_lowercase());
        assert_ne!(hash, payload_hash(&Payload::Empty));
    }

    #[test]
    fn test_unsigned_streaming_sentinel() {
        assert_eq!(payload_hash(&Payload::UnsignedStreaming), "UNSIGNED-PAYLOAD");
    }
}
