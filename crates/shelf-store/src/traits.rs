use crate::error::StoreResult;
use crate::names::BlobName;

/// Named artifact store holding cover bytes.
///
/// All implementations must satisfy these invariants:
/// - `put` is atomic: a concurrent or later `get` sees either nothing or the
///   complete bytes, never a partial write.
/// - `remove` of an absent name succeeds and returns `false`.
/// - All I/O errors are propagated; callers decide whether they are fatal.
pub trait BlobStore: Send + Sync {
    /// Store bytes under `name`, replacing any previous artifact.
    fn put(&self, name: &BlobName, data: &[u8]) -> StoreResult<()>;

    /// Read an artifact. Returns `Ok(None)` if it does not exist.
    fn get(&self, name: &BlobName) -> StoreResult<Option<Vec<u8>>>;

    /// Delete an artifact. Returns `true` if it existed.
    fn remove(&self, name: &BlobName) -> StoreResult<bool>;

    /// Names of every stored artifact, sorted.
    fn list(&self) -> StoreResult<Vec<BlobName>>;
}
