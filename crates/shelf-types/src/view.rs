//! Derived read models. None of these are persisted.

use serde::{Deserialize, Serialize};

use crate::entity::{Book, Collection, Cover, Genre, Review};

/// One page of an ordered listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Number of pages needed to show `total` rows; zero when empty.
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.page_count()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Catalog listing row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub book: Book,
    pub genres: Vec<Genre>,
    pub review_count: u64,
    pub average_rating: Option<f64>,
}

/// Review with the names needed to show it outside its book page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub review: Review,
    pub author_name: String,
    pub book_title: String,
}

/// Everything shown on a single book's page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookDetail {
    pub book: Book,
    pub genres: Vec<Genre>,
    pub covers: Vec<Cover>,
    /// Newest first.
    pub reviews: Vec<ReviewEntry>,
    pub review_count: u64,
    pub average_rating: Option<f64>,
    /// The caller's own review, when the caller is signed in and has one.
    pub own_review: Option<Review>,
}

/// A collection with its derived size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub collection: Collection,
    pub book_count: u64,
}

/// A collection with its member books.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDetail {
    pub collection: Collection,
    pub books: Vec<Book>,
}
