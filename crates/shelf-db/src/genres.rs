use rusqlite::{params, Connection, Row};
use shelf_types::{BookId, Genre, GenreId};

use crate::error::DbResult;

fn genre(row: &Row<'_>) -> rusqlite::Result<Genre> {
    Ok(Genre {
        id: GenreId::new(row.get(0)?),
        name: row.get(1)?,
    })
}

pub fn insert(conn: &Connection, name: &str) -> DbResult<GenreId> {
    conn.execute("INSERT INTO genres (name) VALUES (?1)", params![name])?;
    Ok(GenreId::new(conn.last_insert_rowid()))
}

/// All genres by name.
pub fn list(conn: &Connection) -> DbResult<Vec<Genre>> {
    let mut stmt = conn.prepare("SELECT id, name FROM genres ORDER BY name, id")?;
    let genres = stmt.query_map([], genre)?.collect::<Result<Vec<_>, _>>()?;
    Ok(genres)
}

/// The subset of `ids` that name existing genres, in input order, without duplicates.
pub fn existing(conn: &Connection, ids: &[GenreId]) -> DbResult<Vec<GenreId>> {
    let mut stmt = conn.prepare("SELECT 1 FROM genres WHERE id = ?1")?;
    let mut known = Vec::with_capacity(ids.len());
    for id in ids {
        if known.contains(id) {
            continue;
        }
        if stmt.exists(params![id.get()])? {
            known.push(*id);
        }
    }
    Ok(known)
}

pub fn for_book(conn: &Connection, book: BookId) -> DbResult<Vec<Genre>> {
    let mut stmt = conn.prepare(
        "SELECT genres.id, genres.name FROM genres
         JOIN book_genres ON book_genres.genre_id = genres.id
         WHERE book_genres.book_id = ?1
         ORDER BY genres.name, genres.id",
    )?;
    let genres = stmt
        .query_map(params![book.get()], genre)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(genres)
}
