//! Content-addressed cover images.
//!
//! A cover row is created at most once per distinct content hash. The bytes
//! live in the blob store under `<cover_id>.<ext>`; rows and associations
//! live in the database. Blob writes happen inside the database transaction
//! that creates the row, so a failed write rolls the row back. A blob left
//! behind by a transaction that failed later is an orphan and is removed by
//! [`Library::sweep_orphan_covers`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shelf_crypto::ContentHasher;
use shelf_db::{books, covers, Connection, DbError};
use shelf_policy::{Action, Principal};
use shelf_store::{
    cover_blob_name, cover_extension, BlobName, BlobStore, ALLOWED_COVER_EXTENSIONS,
};
use shelf_types::{BookId, Cover, CoverId};

use crate::error::{LibraryError, LibraryResult};
use crate::library::Library;

/// An uploaded image as received from the caller.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverUpload {
    pub bytes: Vec<u8>,
    /// File name as declared by the uploader; only its extension is trusted.
    pub filename: String,
    pub mime_type: String,
}

impl CoverUpload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Checks that need no storage. Returns the normalized extension.
    pub(crate) fn check(&self, max_bytes: u64) -> LibraryResult<String> {
        let ext = cover_extension(&self.filename).ok_or_else(|| {
            LibraryError::UnsupportedMediaType(format!(
                "{:?} is not one of {}",
                self.filename,
                ALLOWED_COVER_EXTENSIONS.join(", ")
            ))
        })?;
        if self.bytes.is_empty() {
            return Err(LibraryError::validation("cover", "file is empty"));
        }
        if self.bytes.len() as u64 > max_bytes {
            return Err(LibraryError::validation(
                "cover",
                format!("must be at most {max_bytes} bytes"),
            ));
        }
        Ok(ext)
    }

    /// Last path component of the declared name.
    fn base_name(&self) -> &str {
        self.filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.filename)
    }
}

impl std::fmt::Debug for CoverUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverUpload")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

const CONCURRENT_COVER: &str = "An identical cover was uploaded at the same time.";

/// A cover insert that lost the race for its content hash is a conflict.
fn cover_insert_error(e: DbError) -> LibraryError {
    if e.is_unique_violation() {
        LibraryError::Conflict(CONCURRENT_COVER.into())
    } else {
        e.into()
    }
}

/// Attach `upload` to `book` within the caller's transaction.
///
/// `ext` must come from [`CoverUpload::check`]. Reuses the existing cover
/// when the content hash is already known; otherwise inserts the row,
/// names the artifact after the new id and writes the bytes.
pub(crate) fn accept(
    conn: &Connection,
    blobs: &dyn BlobStore,
    upload: &CoverUpload,
    ext: &str,
    book: BookId,
) -> LibraryResult<CoverId> {
    let hash = ContentHasher::hash(&upload.bytes);

    if let Some(existing) = covers::find_by_hash(conn, &hash)? {
        covers::link(conn, book, existing.id)?;
        tracing::debug!(
            cover = existing.id.get(),
            book = book.get(),
            hash = %hash.short_hex(),
            "cover reused"
        );
        return Ok(existing.id);
    }

    let id = covers::insert(conn, upload.base_name(), &upload.mime_type, &hash)
        .map_err(cover_insert_error)?;
    let name = cover_blob_name(id, ext)?;
    covers::set_filename(conn, id, name.as_str())?;
    covers::link(conn, book, id)?;

    blobs.put(&name, &upload.bytes).map_err(|e| {
        tracing::warn!(cover = id.get(), blob = %name, error = %e, "cover write failed");
        LibraryError::Storage(format!("could not store cover: {e}"))
    })?;
    tracing::info!(
        cover = id.get(),
        book = book.get(),
        bytes = upload.bytes.len(),
        "cover stored"
    );
    Ok(id)
}

/// Delete the artifact of `cover`. An absent artifact is not an error.
fn remove_artifact(blobs: &dyn BlobStore, cover: &Cover) -> LibraryResult<()> {
    let name = BlobName::new(&cover.filename)?;
    if !blobs.remove(&name)? {
        tracing::debug!(cover = cover.id.get(), blob = %name, "cover artifact already absent");
    }
    Ok(())
}

/// Best-effort artifact removal after a commit: failures are logged and skipped.
pub(crate) fn remove_artifacts(blobs: &dyn BlobStore, removed: &[Cover]) {
    for cover in removed {
        if let Err(e) = remove_artifact(blobs, cover) {
            tracing::warn!(
                cover = cover.id.get(),
                file = %cover.filename,
                error = %e,
                "could not remove cover artifact"
            );
        }
    }
}

impl Library {
    /// Add a cover to an existing book.
    pub fn accept_cover(
        &mut self,
        identity: Option<&Principal>,
        book_id: BookId,
        upload: &CoverUpload,
    ) -> LibraryResult<CoverId> {
        self.policy.authorize(identity, Action::EditBook)?;
        let ext = upload.check(self.config.max_cover_bytes)?;
        let blobs = self.blobs.as_ref();
        self.db.transaction(|tx| {
            if !books::exists(tx, book_id)? {
                return Err(LibraryError::not_found("book", book_id.get()));
            }
            accept(tx, blobs, upload, &ext, book_id)
        })
    }

    /// Delete a cover row with its associations, then its stored bytes.
    ///
    /// The row deletion is the outcome; an artifact that cannot be removed
    /// afterwards is logged and left for [`Library::sweep_orphan_covers`].
    pub fn remove_cover(
        &mut self,
        identity: Option<&Principal>,
        cover_id: CoverId,
    ) -> LibraryResult<()> {
        self.policy.authorize(identity, Action::EditBook)?;
        let cover = self.db.transaction(|tx| {
            let cover = covers::get(tx, cover_id)?
                .ok_or_else(|| LibraryError::not_found("cover", cover_id.get()))?;
            covers::delete(tx, cover_id)?;
            Ok::<_, LibraryError>(cover)
        })?;
        remove_artifacts(self.blobs.as_ref(), std::slice::from_ref(&cover));
        tracing::info!(cover = cover_id.get(), "cover removed");
        Ok(())
    }

    /// Covers shown for `book_id`, oldest first.
    pub fn covers_for_book(&self, book_id: BookId) -> LibraryResult<Vec<Cover>> {
        Ok(covers::for_book(self.db.conn(), book_id)?)
    }

    /// Cover metadata and bytes.
    pub fn read_cover(&self, cover_id: CoverId) -> LibraryResult<(Cover, Vec<u8>)> {
        let cover = covers::get(self.db.conn(), cover_id)?
            .ok_or_else(|| LibraryError::not_found("cover", cover_id.get()))?;
        let name = BlobName::new(&cover.filename)?;
        let bytes = self
            .blobs
            .get(&name)?
            .ok_or_else(|| LibraryError::not_found("cover artifact", &cover.filename))?;
        Ok((cover, bytes))
    }

    /// Remove stored artifacts that no cover row refers to.
    ///
    /// Returns the names removed.
    pub fn sweep_orphan_covers(
        &self,
        identity: Option<&Principal>,
    ) -> LibraryResult<Vec<BlobName>> {
        self.policy.authorize(identity, Action::ManageCatalog)?;
        let referenced: HashSet<String> = covers::filenames(self.db.conn())?.into_iter().collect();
        let mut removed = Vec::new();
        for name in self.blobs.list()? {
            if referenced.contains(name.as_str()) {
                continue;
            }
            if self.blobs.remove(&name)? {
                removed.push(name);
            }
        }
        tracing::info!(removed = removed.len(), "orphan cover sweep finished");
        Ok(removed)
    }
}
