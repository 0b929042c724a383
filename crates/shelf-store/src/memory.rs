use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::names::BlobName;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Artifacts are held behind a `RwLock`
/// and cloned on read. Every successful `put` is counted so callers can
/// assert how many artifacts were actually written.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobName, Vec<u8>>>,
    writes: AtomicU64,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of artifacts currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Number of `put` calls that completed, including overwrites.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, name: &BlobName, data: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(name.clone(), data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, name: &BlobName) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(name).cloned())
    }

    fn remove(&self, name: &BlobName) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(name).is_some())
    }

    fn list(&self) -> StoreResult<Vec<BlobName>> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut names: Vec<BlobName> = map.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("writes", &self.write_count())
            .finish()
    }
}
