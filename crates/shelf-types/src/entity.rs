//! Persisted entities.
//!
//! These mirror the relational rows one-to-one. Association tables
//! (book–genre, book–cover, book–collection) have no entity of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::ids::{BookId, CollectionId, CoverId, GenreId, ReviewId, RoleId, UserId};

/// A registered account. The password credential never leaves the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub role_id: RoleId,
    pub role_name: String,
}

impl User {
    /// "Last First" or "Last First Middle".
    pub fn full_name(&self) -> String {
        Self::compose_full_name(&self.last_name, &self.first_name, self.middle_name.as_deref())
    }

    /// Same rule as [`User::full_name`], for callers holding only the parts.
    pub fn compose_full_name(last: &str, first: &str, middle: Option<&str>) -> String {
        match middle {
            Some(middle) if !middle.trim().is_empty() => format!("{last} {first} {middle}"),
            _ => format!("{last} {first}"),
        }
    }
}

/// A named tag attached to books.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub description: String,
    pub year: i32,
    pub publisher: String,
    pub author: String,
    pub pages: i32,
}

/// Scalar fields of a book as submitted for create or edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    pub title: String,
    pub description: String,
    pub year: i32,
    pub publisher: String,
    pub author: String,
    pub pages: i32,
}

/// A stored cover image, shared by every book whose upload hashed the same.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    pub id: CoverId,
    pub filename: String,
    pub mime_type: String,
    pub content_hash: ContentHash,
}

/// A reader's rating and opinion of one book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A named, user-owned set of books.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub user_id: UserId,
    pub name: String,
}
