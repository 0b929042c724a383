use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::names::BlobName;
use crate::traits::BlobStore;

/// Blob store backed by a single flat directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a crash mid-write never leaves a truncated artifact under its
/// final name. Temporary files start with `.` and are never listed.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of an artifact (whether or not it exists).
    pub fn path_of(&self, name: &BlobName) -> PathBuf {
        self.root.join(name.as_str())
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, name: &BlobName, data: &[u8]) -> StoreResult<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_of(name))
            .map_err(|e| StoreError::Io(e.error))?;
        tracing::debug!(blob = %name, bytes = data.len(), "artifact written");
        Ok(())
    }

    fn get(&self, name: &BlobName) -> StoreResult<Option<Vec<u8>>> {
        match std::fs::read(self.path_of(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, name: &BlobName) -> StoreResult<bool> {
        match std::fs::remove_file(self.path_of(name)) {
            Ok(()) => {
                tracing::debug!(blob = %name, "artifact removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<BlobName>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            // Skips in-flight temp files and anything else that is not a valid name.
            if let Ok(name) = BlobName::new(file_name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BlobName {
        BlobName::new(s).unwrap()
    }

    #[test]
    fn open_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("static").join("covers");
        let store = FsBlobStore::open(&root).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn put_writes_file_under_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(&name("5.png"), b"\x89PNG").unwrap();
        assert_eq!(std::fs::read(dir.path().join("5.png")).unwrap(), b"\x89PNG");
        assert_eq!(store.list().unwrap(), vec![name("5.png")]);
    }

    #[test]
    fn get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        assert!(store.get(&name("missing.jpg")).unwrap().is_none());
    }

    #[test]
    fn remove_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(&name("7.gif"), b"GIF89a").unwrap();
        assert!(store.remove(&name("7.gif")).unwrap());
        assert!(!store.remove(&name("7.gif")).unwrap());
    }

    #[test]
    fn list_skips_hidden_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(&name("2.png"), b"b").unwrap();
        store.put(&name("1.png"), b"a").unwrap();
        std::fs::write(dir.path().join(".upload-abc"), b"partial").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let listed: Vec<String> = store.list().unwrap().into_iter().map(String::from).collect();
        assert_eq!(listed, vec!["1.png", "2.png"]);
    }

    #[test]
    fn put_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(&name("9.jpg"), b"jpeg").unwrap();
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
