use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_types::{BookId, ContentHash, Cover, CoverId};

use crate::error::{DbError, DbResult};
use crate::rows;

const COVER_COLUMNS: &str = "covers.id, covers.filename, covers.mime_type, covers.content_hash";

fn cover(row: &Row<'_>) -> rusqlite::Result<Cover> {
    Ok(Cover {
        id: CoverId::new(row.get(0)?),
        filename: row.get(1)?,
        mime_type: row.get(2)?,
        content_hash: rows::content_hash(row, 3)?,
    })
}

fn query(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> DbResult<Vec<Cover>> {
    let mut stmt = conn.prepare(sql)?;
    let covers = stmt.query_map(args, cover)?.collect::<Result<Vec<_>, _>>()?;
    Ok(covers)
}

/// Global lookup by content hash; there is at most one cover per hash.
pub fn find_by_hash(conn: &Connection, hash: &ContentHash) -> DbResult<Option<Cover>> {
    let found = conn
        .query_row(
            &format!("SELECT {COVER_COLUMNS} FROM covers WHERE content_hash = ?1"),
            params![hash.to_hex()],
            cover,
        )
        .optional()?;
    Ok(found)
}

pub fn get(conn: &Connection, id: CoverId) -> DbResult<Option<Cover>> {
    let found = conn
        .query_row(
            &format!("SELECT {COVER_COLUMNS} FROM covers WHERE id = ?1"),
            params![id.get()],
            cover,
        )
        .optional()?;
    Ok(found)
}

/// Insert a cover row. A second row with the same hash is a unique violation.
pub fn insert(
    conn: &Connection,
    filename: &str,
    mime_type: &str,
    hash: &ContentHash,
) -> DbResult<CoverId> {
    conn.execute(
        "INSERT INTO covers (filename, mime_type, content_hash) VALUES (?1, ?2, ?3)",
        params![filename, mime_type, hash.to_hex()],
    )?;
    Ok(CoverId::new(conn.last_insert_rowid()))
}

pub fn set_filename(conn: &Connection, id: CoverId, filename: &str) -> DbResult<()> {
    let n = conn.execute(
        "UPDATE covers SET filename = ?1 WHERE id = ?2",
        params![filename, id.get()],
    )?;
    if n == 0 {
        return Err(DbError::NotFound {
            entity: "cover",
            id: id.get(),
        });
    }
    Ok(())
}

/// Associate a cover with a book. Linking twice is a no-op.
pub fn link(conn: &Connection, book: BookId, cover: CoverId) -> DbResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO book_covers (book_id, cover_id) VALUES (?1, ?2)",
        params![book.get(), cover.get()],
    )?;
    Ok(())
}

pub fn for_book(conn: &Connection, book: BookId) -> DbResult<Vec<Cover>> {
    query(
        conn,
        &format!(
            "SELECT {COVER_COLUMNS} FROM covers
             JOIN book_covers ON book_covers.cover_id = covers.id
             WHERE book_covers.book_id = ?1 ORDER BY covers.id"
        ),
        params![book.get()],
    )
}

/// Covers that no book refers to any more.
pub fn unlinked(conn: &Connection) -> DbResult<Vec<Cover>> {
    query(
        conn,
        &format!(
            "SELECT {COVER_COLUMNS} FROM covers
             WHERE NOT EXISTS (SELECT 1 FROM book_covers WHERE book_covers.cover_id = covers.id)
             ORDER BY covers.id"
        ),
        [],
    )
}

/// Every stored artifact name a cover row refers to.
pub fn filenames(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT filename FROM covers ORDER BY id")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

pub fn delete(conn: &Connection, id: CoverId) -> DbResult<bool> {
    let n = conn.execute("DELETE FROM covers WHERE id = ?1", params![id.get()])?;
    Ok(n > 0)
}
