//! Catalog services for Shelf.
//!
//! [`Library`] is the single entry point for applications embedding the
//! catalog. It owns the relational store, the cover artifact store and the
//! policy table, and exposes every operation as a method that takes the
//! caller's identity explicitly.
//!
//! # Quick Start
//!
//! ```rust
//! use shelf_sdk::{Library, NewUser};
//! use shelf_types::BookFields;
//!
//! let mut lib = Library::in_memory().unwrap();
//! lib.bootstrap_admin(&NewUser {
//!     login: "admin".into(),
//!     password: "change-me".into(),
//!     last_name: "Root".into(),
//!     first_name: "Ada".into(),
//!     middle_name: None,
//! })
//! .unwrap();
//! let admin = lib.authenticate("admin", "change-me").unwrap().unwrap();
//!
//! let fields = BookFields {
//!     title: "Foo".into(),
//!     description: "A book about foo.".into(),
//!     year: 2001,
//!     publisher: "Acme".into(),
//!     author: "J. Doe".into(),
//!     pages: 120,
//! };
//! let id = lib.create_book(Some(&admin), &fields, &[], None).unwrap();
//! assert_eq!(lib.list_books(1, 10).unwrap().items[0].book.id, id);
//! ```
//!
//! # Operation Groups
//!
//! - catalog: books and genres
//! - covers: content-addressed cover images
//! - reviews: one review per reader per book, aggregates, moderation
//! - collections: reader-owned book lists
//! - accounts: users, login, bootstrap

pub mod accounts;
pub mod catalog;
pub mod collections;
pub mod config;
pub mod covers;
pub mod error;
pub mod library;
pub mod reviews;
pub mod sanitize;
pub mod validate;

pub use accounts::NewUser;
pub use collections::ToggleResponse;
pub use config::LibraryConfig;
pub use covers::CoverUpload;
pub use error::{LibraryError, LibraryResult};
pub use library::Library;
pub use sanitize::sanitize_markup;

// Re-export key types
pub use shelf_policy::{Action, Principal};
pub use shelf_types::{
    Book, BookDetail, BookFields, BookId, BookSummary, CollectionDetail, CollectionId,
    CollectionSummary, Cover, CoverId, Genre, GenreId, Page, Review, ReviewEntry, ReviewId,
    UserId,
};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use shelf_db::{roles, users, Database, NewUserRow};
    use shelf_policy::{PolicyTable, Principal};
    use shelf_store::InMemoryBlobStore;
    use shelf_types::{BookFields, BuiltinRole};

    use crate::config::LibraryConfig;
    use crate::library::Library;

    /// A library over an in-memory database and blob store.
    ///
    /// Accounts are inserted straight into the database with a dummy
    /// credential so tests do not pay for password hashing.
    pub struct Fixture {
        pub lib: Library,
        pub blobs: Arc<InMemoryBlobStore>,
        admin: Option<Principal>,
    }

    impl Fixture {
        pub fn new() -> Self {
            let blobs = Arc::new(InMemoryBlobStore::new());
            let lib = Library::from_parts(
                Database::open_in_memory().unwrap(),
                blobs.clone(),
                PolicyTable::standard(),
                LibraryConfig::default(),
            );
            Self::with_library(lib, blobs)
        }

        /// Wrap a library built elsewhere; `blobs` is what tests inspect.
        pub fn with_library(lib: Library, blobs: Arc<InMemoryBlobStore>) -> Self {
            Self {
                lib,
                blobs,
                admin: None,
            }
        }

        /// The fixture's administrator, created on first use.
        pub fn admin(&mut self) -> Principal {
            if let Some(admin) = &self.admin {
                return admin.clone();
            }
            let admin = self.account("admin", BuiltinRole::Administrator.name());
            self.admin = Some(admin.clone());
            admin
        }

        pub fn reader(&mut self, login: &str) -> Principal {
            self.account(login, BuiltinRole::Reader.name())
        }

        pub fn account(&mut self, login: &str, role: &str) -> Principal {
            let conn = self.lib.database().conn();
            let role_row = roles::find_by_name(conn, role).unwrap().unwrap();
            let id = users::insert(
                conn,
                &NewUserRow {
                    login,
                    password_hash: "unused",
                    last_name: role,
                    first_name: login,
                    middle_name: None,
                    role_id: role_row.id,
                },
            )
            .unwrap();
            Principal::new(id, role)
        }
    }

    pub fn staff(fx: &mut Fixture, login: &str, role: &str) -> Principal {
        fx.account(login, role)
    }

    pub fn book_fields(title: &str) -> BookFields {
        BookFields {
            title: title.into(),
            description: "Plain description.".into(),
            year: 2001,
            publisher: "Acme".into(),
            author: "J. Doe".into(),
            pages: 120,
        }
    }
}
