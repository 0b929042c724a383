//! Cover artifact storage for the Shelf catalog.
//!
//! The relational store decides *which* cover an upload maps to (by content
//! hash); this crate only holds the bytes. Artifacts are addressed by a
//! deterministic [`BlobName`] of the form `<cover_id>.<extension>`.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`FsBlobStore`] -- one flat upload directory on disk
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A write is all-or-nothing from a reader's point of view.
//! 2. Removing an absent artifact is not an error.
//! 3. Names never contain path separators, so an artifact cannot escape the root.
//! 4. The store never interprets artifact contents.

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use names::{cover_blob_name, cover_extension, BlobName, ALLOWED_COVER_EXTENSIONS};
pub use traits::BlobStore;
