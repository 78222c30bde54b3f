use blake3::Hasher;

/// Hashes a normalized query for use as a result-cache key.
#[inline]
pub fn hash_query(normalized: &str) -> [u8; 32] {
    *blake3::hash(normalized.as_bytes()).as_bytes()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// 64 bits is plenty for record ids and fingerprint keys: at a million
/// records the birthday-bound collision probability is on the order of
/// 0.00003%, and a collision here costs a re-encoded embedding or a cache
/// miss, never data corruption. Not for cryptographic use.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Maps a store document id to a stable numeric record id.
#[inline]
pub fn hash_record_id(store_id: &str) -> u64 {
    hash_to_u64(store_id.as_bytes())
}

/// Content fingerprint of a record's normalized name.
///
/// Used by the store gateway to reuse embeddings across refreshes when the
/// text that produced them has not changed.
#[inline]
pub fn hash_record_content(store_id: &str, normalized_name: &str) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(store_id.as_bytes());
    hasher.update(b"|");
    hasher.update(normalized_name.as_bytes());

    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_hash_is_stable() {
        assert_eq!(hash_query("john smith"), hash_query("john smith"));
        assert_ne!(hash_query("john smith"), hash_query("jane smith"));
    }

    #[test]
    fn record_id_is_stable_across_calls() {
        assert_eq!(hash_record_id("doc-42"), hash_record_id("doc-42"));
    }

    #[test]
    fn content_fingerprint_changes_with_either_part() {
        let base = hash_record_content("doc-1", "john smith");
        assert_ne!(base, hash_record_content("doc-2", "john smith"));
        assert_ne!(base, hash_record_content("doc-1", "jon smyth"));
    }
}
