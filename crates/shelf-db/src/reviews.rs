use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_types::{BookId, Review, ReviewEntry, ReviewId, User, UserId};

use crate::error::DbResult;
use crate::rows;

const REVIEW_COLUMNS: &str = "reviews.id, reviews.book_id, reviews.user_id, reviews.rating, \
     reviews.text, reviews.created_at";

const ENTRY_SELECT: &str = "SELECT reviews.id, reviews.book_id, reviews.user_id, reviews.rating, \
     reviews.text, reviews.created_at, users.last_name, users.first_name, users.middle_name, books.title \
     FROM reviews \
     JOIN users ON users.id = reviews.user_id \
     JOIN books ON books.id = reviews.book_id";

/// Review count and raw mean rating of one book.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReviewStats {
    pub count: u64,
    /// `None` when the book has no reviews.
    pub mean: Option<f64>,
}

fn review(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: ReviewId::new(row.get(0)?),
        book_id: BookId::new(row.get(1)?),
        user_id: UserId::new(row.get(2)?),
        rating: row.get(3)?,
        text: row.get(4)?,
        created_at: rows::timestamp(row, 5)?,
    })
}

fn entry(row: &Row<'_>) -> rusqlite::Result<ReviewEntry> {
    let last: String = row.get(6)?;
    let first: String = row.get(7)?;
    let middle: Option<String> = row.get(8)?;
    Ok(ReviewEntry {
        review: review(row)?,
        author_name: User::compose_full_name(&last, &first, middle.as_deref()),
        book_title: row.get(9)?,
    })
}

/// Insert a review. A second review for the same (book, user) is a unique violation.
pub fn insert(
    conn: &Connection,
    book: BookId,
    user: UserId,
    rating: u8,
    text: &str,
    created_at: DateTime<Utc>,
) -> DbResult<ReviewId> {
    conn.execute(
        "INSERT INTO reviews (book_id, user_id, rating, text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            book.get(),
            user.get(),
            rating,
            text,
            created_at.timestamp_millis()
        ],
    )?;
    Ok(ReviewId::new(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: ReviewId) -> DbResult<Option<Review>> {
    let found = conn
        .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
            params![id.get()],
            review,
        )
        .optional()?;
    Ok(found)
}

pub fn by_book_and_user(conn: &Connection, book: BookId, user: UserId) -> DbResult<Option<Review>> {
    let found = conn
        .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE book_id = ?1 AND user_id = ?2"),
            params![book.get(), user.get()],
            review,
        )
        .optional()?;
    Ok(found)
}

pub fn delete(conn: &Connection, id: ReviewId) -> DbResult<bool> {
    let n = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id.get()])?;
    Ok(n > 0)
}

pub fn stats(conn: &Connection, book: BookId) -> DbResult<ReviewStats> {
    let (count, mean): (i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), AVG(rating) FROM reviews WHERE book_id = ?1",
        params![book.get()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(ReviewStats {
        count: rows::count(count),
        mean,
    })
}

/// Reviews of one book, newest first.
pub fn for_book(conn: &Connection, book: BookId) -> DbResult<Vec<ReviewEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT} WHERE reviews.book_id = ?1
         ORDER BY reviews.created_at DESC, reviews.id DESC"
    ))?;
    let entries = stmt
        .query_map(params![book.get()], entry)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn count_all(conn: &Connection) -> DbResult<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
    Ok(rows::count(n))
}

/// One window of all reviews across the catalog, newest first.
pub fn page(conn: &Connection, limit: u32, offset: u64) -> DbResult<Vec<ReviewEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT} ORDER BY reviews.created_at DESC, reviews.id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let entries = stmt
        .query_map(params![limit, offset], entry)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
