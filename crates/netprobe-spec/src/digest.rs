//! Artifact content digests (versioned by prefix).
//!
//! Every persisted artifact carries a digest of its exact bytes so a later run
//! (or an auditor) can detect tampering byte for byte:
//!
//! - algorithm: **SHA-256**
//! - input: the raw bytes exactly as returned by the session
//! - output: `"sha256:<64 lowercase hex digits>"`
//!
//! The prefix names the algorithm so manifests stay readable if the digest is
//! ever upgraded.

use sha2::{Digest, Sha256};

/// Prefix used in serialized content hashes.
pub const CONTENT_HASH_PREFIX: &str = "sha256:";

/// Compute the content hash for arbitrary bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{CONTENT_HASH_PREFIX}{digest:x}")
}

/// Check a previously recorded hash against the current bytes.
pub fn verify_content_hash(expected: &str, bytes: &[u8]) -> bool {
    content_hash(bytes) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_has_expected_prefix_and_width() {
        let h = content_hash(b"show version\n");
        assert!(h.starts_with(CONTENT_HASH_PREFIX));
        assert_eq!(h.len(), CONTENT_HASH_PREFIX.len() + 64);
    }

    #[test]
    fn empty_input_hashes_to_known_value() {
        assert_eq!(
            content_hash(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_detects_single_byte_change() {
        let h = content_hash(b"VLAN ID 10");
        assert!(verify_content_hash(&h, b"VLAN ID 10"));
        assert!(!verify_content_hash(&h, b"VLAN ID 11"));
    }
}
