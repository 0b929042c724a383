//! Foundation types for the Shelf library catalog.
//!
//! Every other Shelf crate depends on `shelf-types`. Nothing here touches
//! storage or policy; these are the plain values that flow between layers.
//!
//! # Key Types
//!
//! - [`BookId`], [`UserId`], ... — server-assigned surrogate keys
//! - [`BuiltinRole`] — the permission tiers shipped with the catalog
//! - [`ContentHash`] — BLAKE3 digest used to deduplicate cover images
//! - [`Book`], [`Review`], [`Collection`], ... — persisted entities
//! - [`BookSummary`], [`BookDetail`], ... — derived read models

pub mod entity;
pub mod error;
pub mod hash;
pub mod ids;
pub mod role;
pub mod view;

pub use entity::{Book, BookFields, Collection, Cover, Genre, Review, User};
pub use error::TypeError;
pub use hash::ContentHash;
pub use ids::{BookId, CollectionId, CoverId, GenreId, ReviewId, RoleId, UserId};
pub use role::{BuiltinRole, Role};
pub use view::{
    BookDetail, BookSummary, CollectionDetail, CollectionSummary, Page, ReviewEntry,
};
