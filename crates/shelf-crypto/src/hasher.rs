use shelf_types::ContentHash;

/// BLAKE3 hashing of cover uploads into [`ContentHash`] values.
///
/// Cover deduplication hashes the raw upload bytes with no domain prefix, so
/// the digest of a stored artifact can be recomputed from the file alone.
pub struct ContentHasher;

impl ContentHasher {
    /// One-shot hash of a byte slice.
    pub fn hash(data: &[u8]) -> ContentHash {
        ContentHash::from_digest(*blake3::hash(data).as_bytes())
    }
}
