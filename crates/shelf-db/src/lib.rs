//! Relational store for the Shelf catalog.
//!
//! A single SQLite database holds every entity and association. Repositories
//! are plain functions over `&Connection`, so they run equally against
//! [`Database::conn`] for reads and inside [`Database::transaction`] for
//! writes (a `Transaction` derefs to a `Connection`).
//!
//! # Schema rules
//!
//! - Foreign keys are enforced on every connection.
//! - Deleting a book or a user cascades through the schema, never through
//!   application loops.
//! - One review per (book, user), one cover per content hash, one membership
//!   per (book, collection), unique logins and genre names. The constraints
//!   are authoritative; service-level pre-checks only improve messages.
//!
//! Constraint violations surface as [`DbError::Constraint`] with a
//! [`ConstraintKind`] so callers can map them to their own conflict kinds.

pub mod books;
pub mod collections;
pub mod covers;
pub mod database;
pub mod error;
pub mod genres;
pub mod reviews;
pub mod roles;
pub(crate) mod rows;
pub mod schema;
pub mod users;

pub use database::Database;
pub use error::{ConstraintKind, DbError, DbResult};
pub use reviews::ReviewStats;
pub use users::NewUserRow;

pub use rusqlite::{Connection, Transaction};
