use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_types::{Book, BookId, Collection, CollectionId, CollectionSummary, UserId};

use crate::error::DbResult;
use crate::rows::{self, BOOK_COLUMNS};

fn collection(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: CollectionId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
    })
}

pub fn insert(conn: &Connection, owner: UserId, name: &str) -> DbResult<CollectionId> {
    conn.execute(
        "INSERT INTO collections (user_id, name) VALUES (?1, ?2)",
        params![owner.get(), name],
    )?;
    Ok(CollectionId::new(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: CollectionId) -> DbResult<Option<Collection>> {
    let found = conn
        .query_row(
            "SELECT id, user_id, name FROM collections WHERE id = ?1",
            params![id.get()],
            collection,
        )
        .optional()?;
    Ok(found)
}

pub fn is_member(conn: &Connection, id: CollectionId, book: BookId) -> DbResult<bool> {
    let mut stmt = conn
        .prepare_cached("SELECT 1 FROM book_collections WHERE collection_id = ?1 AND book_id = ?2")?;
    Ok(stmt.exists(params![id.get(), book.get()])?)
}

/// Add a book. An existing membership is a unique (primary key) violation.
pub fn add_member(conn: &Connection, id: CollectionId, book: BookId) -> DbResult<()> {
    conn.execute(
        "INSERT INTO book_collections (book_id, collection_id) VALUES (?1, ?2)",
        params![book.get(), id.get()],
    )?;
    Ok(())
}

pub fn remove_member(conn: &Connection, id: CollectionId, book: BookId) -> DbResult<bool> {
    let n = conn.execute(
        "DELETE FROM book_collections WHERE collection_id = ?1 AND book_id = ?2",
        params![id.get(), book.get()],
    )?;
    Ok(n > 0)
}

/// Collections owned by `owner`, oldest first, with their book counts.
pub fn list_for_user(conn: &Connection, owner: UserId) -> DbResult<Vec<CollectionSummary>> {
    let mut stmt = conn.prepare(
        "SELECT collections.id, collections.user_id, collections.name,
                (SELECT COUNT(*) FROM book_collections WHERE collection_id = collections.id)
         FROM collections WHERE collections.user_id = ?1
         ORDER BY collections.id",
    )?;
    let summaries = stmt
        .query_map(params![owner.get()], |row| {
            let book_count: i64 = row.get(3)?;
            Ok(CollectionSummary {
                collection: collection(row)?,
                book_count: rows::count(book_count),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(summaries)
}

/// Member books by title.
pub fn books(conn: &Connection, id: CollectionId) -> DbResult<Vec<Book>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books
         JOIN book_collections ON book_collections.book_id = books.id
         WHERE book_collections.collection_id = ?1
         ORDER BY books.title, books.id"
    ))?;
    let books = stmt
        .query_map(params![id.get()], rows::book)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}
