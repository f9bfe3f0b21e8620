//! Public id encoding and CDN shard selection

use flate2::Crc;

use crate::constants::CDN_SHARD_COUNT;

/// Characters that must be percent-encoded inside a delivery path.
/// Everything else, `/` and non-ASCII included, passes through.
const RESERVED: &[u8] = b"!*'\"();@&=+$,?%#[] ";

/// Percent-encode the reserved delivery characters
pub fn smart_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii() && RESERVED.contains(&(ch as u8)) {
            out.push_str(&format!("%{:02X}", ch as u8));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Percent-decode `input`. Returns `None` when the decoded bytes are not
/// valid UTF-8.
pub fn percent_decode(input: &str) -> Option<String> {
    urlencoding::decode(input).ok().map(|s| s.into_owned())
}

/// zlib-compatible CRC-32
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// CDN shard (1..=5) for a source name
pub fn shard_for(source_name: &str) -> u32 {
    crc32(source_name.as_bytes()) % CDN_SHARD_COUNT + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_encode_keeps_slashes_and_unreserved() {
        assert_eq!(smart_encode("folder/my-image_1.jpg"), "folder/my-image_1.jpg");
    }

    #[test]
    fn test_smart_encode_reserved_characters() {
        assert_eq!(smart_encode("a b"), "a%20b");
        assert_eq!(smart_encode("a,b?c#d"), "a%2Cb%3Fc%23d");
        assert_eq!(smart_encode("100%"), "100%25");
    }

    #[test]
    fn test_smart_encode_keeps_non_ascii() {
        assert_eq!(smart_encode("קובץ"), "קובץ");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("%FF"), None);
    }

    #[test]
    fn test_crc32_known_values() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_shard_is_in_range() {
        for name in ["sample", "a/b/c.jpg", "x"] {
            let shard = shard_for(name);
            assert!((1..=CDN_SHARD_COUNT).contains(&shard));
        }
    }
}
