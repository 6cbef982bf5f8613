// Deterministic short identifiers derived from SHA-256 digests
use sha2::{Digest, Sha256};

/// Hex digest of `input`, truncated to `len` characters (max 64)
pub fn short_id(input: &str, len: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(len.min(hex.len()));
    hex
}

/// Short id over raw bytes (used for content-derived vector keys)
pub fn short_id_bytes(input: &[u8], len: usize) -> String {
    let digest = Sha256::digest(input);
    let mut hex = format!("{:x}", digest);
    hex.truncate(len.min(hex.len()));
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_is_stable() {
        assert_eq!(short_id("IMG_0001", 8), short_id("IMG_0001", 8));
        assert_ne!(short_id("IMG_0001", 8), short_id("IMG_0002", 8));
    }

    #[test]
    fn test_short_id_length() {
        assert_eq!(short_id("abc", 12).len(), 12);
        assert!(short_id("abc", 12).chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(short_id("abc", 100).len(), 64);
    }
}
