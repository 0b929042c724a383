use rusqlite::{params, Connection, OptionalExtension};
use shelf_types::{Book, BookFields, BookId, GenreId};

use crate::error::{DbError, DbResult};
use crate::rows::{self, BOOK_COLUMNS};

pub fn insert(conn: &Connection, fields: &BookFields) -> DbResult<BookId> {
    conn.execute(
        "INSERT INTO books (title, description, year, publisher, author, pages)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            fields.title,
            fields.description,
            fields.year,
            fields.publisher,
            fields.author,
            fields.pages,
        ],
    )?;
    Ok(BookId::new(conn.last_insert_rowid()))
}

/// Overwrite every scalar field of an existing book.
pub fn update(conn: &Connection, id: BookId, fields: &BookFields) -> DbResult<()> {
    let n = conn.execute(
        "UPDATE books SET title = ?1, description = ?2, year = ?3, publisher = ?4,
         author = ?5, pages = ?6 WHERE id = ?7",
        params![
            fields.title,
            fields.description,
            fields.year,
            fields.publisher,
            fields.author,
            fields.pages,
            id.get(),
        ],
    )?;
    if n == 0 {
        return Err(DbError::NotFound {
            entity: "book",
            id: id.get(),
        });
    }
    Ok(())
}

/// Replace the book's genre set with exactly `genres`.
pub fn replace_genres(conn: &Connection, id: BookId, genres: &[GenreId]) -> DbResult<()> {
    conn.execute("DELETE FROM book_genres WHERE book_id = ?1", params![id.get()])?;
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO book_genres (book_id, genre_id) VALUES (?1, ?2)")?;
    for genre in genres {
        stmt.execute(params![id.get(), genre.get()])?;
    }
    Ok(())
}

/// Delete a book and, through the schema cascade, its reviews and associations.
pub fn delete(conn: &Connection, id: BookId) -> DbResult<bool> {
    let n = conn.execute("DELETE FROM books WHERE id = ?1", params![id.get()])?;
    Ok(n > 0)
}

pub fn get(conn: &Connection, id: BookId) -> DbResult<Option<Book>> {
    let found = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE books.id = ?1"),
            params![id.get()],
            rows::book,
        )
        .optional()?;
    Ok(found)
}

pub fn exists(conn: &Connection, id: BookId) -> DbResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM books WHERE id = ?1")?;
    Ok(stmt.exists(params![id.get()])?)
}

pub fn count(conn: &Connection) -> DbResult<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
    Ok(rows::count(n))
}

/// One window of the catalog, newest publication year first, ties by id descending.
pub fn list_page(conn: &Connection, limit: u32, offset: u64) -> DbResult<Vec<Book>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books ORDER BY books.year DESC, books.id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let books = stmt
        .query_map(params![limit, offset], rows::book)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}
