//! Channel-page request token encoder.
//!
//! The browse endpoint takes an opaque ctoken selecting a channel's video
//! tab and page. The token is a small nested protobuf message, base64url
//! encoded; only the fields needed for page selection are emitted. Pure and
//! stateless.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

const WIRE_VARINT: u8 = 0;
const WIRE_BYTES: u8 = 2;

/// Build the browse ctoken for one page of a channel's video listing.
/// Pages are 1-based; page 0 is clamped to 1.
pub fn channel_page_token(channel_id: &str, page: u32) -> String {
    // Inner message: tab name plus 1-based page selector.
    let mut inner = Vec::new();
    push_str(&mut inner, 2, "videos");
    push_varint(&mut inner, 3, u64::from(page.max(1)));

    let mut outer = Vec::new();
    push_str(&mut outer, 2, channel_id);
    push_bytes(&mut outer, 3, &inner);

    URL_SAFE_NO_PAD.encode(outer)
}

fn field_key(field: u32, wire: u8) -> u8 {
    ((field as u8) << 3) | wire
}

fn push_raw_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

fn push_varint(buf: &mut Vec<u8>, field: u32, value: u64) {
    buf.push(field_key(field, WIRE_VARINT));
    push_raw_varint(buf, value);
}

fn push_bytes(buf: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    buf.push(field_key(field, WIRE_BYTES));
    push_raw_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn push_str(buf: &mut Vec<u8>, field: u32, value: &str) {
    push_bytes(buf, field, value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_deterministic() {
        let a = channel_page_token("UCabc", 2);
        let b = channel_page_token("UCabc", 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pages_produce_distinct_tokens() {
        assert_ne!(channel_page_token("UCabc", 1), channel_page_token("UCabc", 2));
        assert_ne!(channel_page_token("UCabc", 1), channel_page_token("UCdef", 1));
    }

    #[test]
    fn test_page_zero_clamps_to_one() {
        assert_eq!(channel_page_token("UCabc", 0), channel_page_token("UCabc", 1));
    }

    #[test]
    fn test_token_decodes_and_embeds_channel_id() {
        let decoded = URL_SAFE_NO_PAD
            .decode(channel_page_token("UCabc", 1))
            .unwrap();
        let haystack = String::from_utf8_lossy(&decoded).to_string();
        assert!(haystack.contains("UCabc"));
        assert!(haystack.contains("videos"));
    }
}
