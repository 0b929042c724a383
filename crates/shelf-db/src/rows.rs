//! Column decoding shared by the repositories.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use shelf_types::{Book, BookId, ContentHash};

/// Columns selected by every query that returns whole books.
pub(crate) const BOOK_COLUMNS: &str =
    "books.id, books.title, books.description, books.year, books.publisher, books.author, books.pages";

pub(crate) fn book(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: BookId::new(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        year: row.get(3)?,
        publisher: row.get(4)?,
        author: row.get(5)?,
        pages: row.get(6)?,
    })
}

pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {millis} out of range").into(),
        )
    })
}

pub(crate) fn content_hash(row: &Row<'_>, idx: usize) -> rusqlite::Result<ContentHash> {
    let hex: String = row.get(idx)?;
    ContentHash::from_hex(&hex)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
