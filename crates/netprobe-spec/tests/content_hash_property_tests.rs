use netprobe_spec::{content_hash, verify_content_hash, CONTENT_HASH_PREFIX};
use proptest::prelude::*;

fn device_output() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..512)
}

proptest! {
    #[test]
    fn identical_bytes_hash_identically(bytes in device_output()) {
        let copy = bytes.clone();
        prop_assert_eq!(content_hash(&bytes), content_hash(&copy));
        prop_assert!(verify_content_hash(&content_hash(&bytes), &copy));
    }

    #[test]
    fn any_single_byte_change_changes_the_hash(
        bytes in proptest::collection::vec(any::<u8>(), 1..512),
        idx in any::<prop::sample::Index>(),
        delta in 1u8..=255,
    ) {
        let mut tampered = bytes.clone();
        let i = idx.index(tampered.len());
        tampered[i] = tampered[i].wrapping_add(delta);
        prop_assert_ne!(content_hash(&bytes), content_hash(&tampered));
    }

    #[test]
    fn hash_is_prefixed_lowercase_hex(bytes in device_output()) {
        let h = content_hash(&bytes);
        prop_assert!(h.starts_with(CONTENT_HASH_PREFIX));
        let hex = &h[CONTENT_HASH_PREFIX.len()..];
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
