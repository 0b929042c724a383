//! Versioned schema migrations.
//!
//! Each migration is applied once, inside its own transaction, and recorded
//! in `schema_migrations`. Built-in roles are seeded after the migrations
//! run and are re-seeded idempotently on every open.

use rusqlite::{params, Connection, OptionalExtension};
use shelf_types::BuiltinRole;

use crate::error::{DbError, DbResult};

const MIGRATIONS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    id TEXT PRIMARY KEY NOT NULL,
    applied_at INTEGER NOT NULL
);";

const INITIAL_SQL: &str = "
CREATE TABLE roles (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    login TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    middle_name TEXT,
    role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE RESTRICT,
    created_at INTEGER NOT NULL
);

CREATE TABLE genres (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE books (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    year INTEGER NOT NULL,
    publisher TEXT NOT NULL,
    author TEXT NOT NULL,
    pages INTEGER NOT NULL CHECK (pages >= 1)
);

CREATE TABLE book_genres (
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, genre_id)
);

CREATE TABLE covers (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE
);

CREATE TABLE book_covers (
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    cover_id INTEGER NOT NULL REFERENCES covers(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, cover_id)
);

CREATE TABLE reviews (
    id INTEGER PRIMARY KEY,
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5),
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (book_id, user_id)
);

CREATE TABLE collections (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);

CREATE TABLE book_collections (
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, collection_id)
);
";

const LISTING_INDEXES_SQL: &str = "
CREATE INDEX IF NOT EXISTS books_year_idx ON books(year DESC, id DESC);
CREATE INDEX IF NOT EXISTS reviews_created_idx ON reviews(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS collections_user_idx ON collections(user_id);
";

/// Ordered list of `(id, sql)` migrations.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("0000_initial", INITIAL_SQL),
    ("0001_listing_indexes", LISTING_INDEXES_SQL),
];

/// Bring the schema up to date and seed the built-in roles.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch(MIGRATIONS_TABLE_SQL)?;
    for &(id, sql) in MIGRATIONS {
        apply_migration(conn, id, sql)?;
    }
    seed_builtin_roles(conn)
}

/// Ids of the migrations already recorded, in application order.
pub fn applied_migrations(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM schema_migrations ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn apply_migration(conn: &mut Connection, id: &'static str, sql: &str) -> DbResult<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM schema_migrations WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(sql)
        .map_err(|source| DbError::Migration { id, source })?;
    tx.execute(
        "INSERT INTO schema_migrations (id, applied_at) VALUES (?1, ?2)",
        params![id, chrono::Utc::now().timestamp_millis()],
    )?;
    tx.commit()?;
    tracing::info!(migration = id, "schema migration applied");
    Ok(())
}

fn seed_builtin_roles(conn: &Connection) -> DbResult<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO roles (name, description) VALUES (?1, ?2)")?;
    for role in BuiltinRole::ALL {
        stmt.execute(params![role.name(), role.description()])?;
    }
    Ok(())
}
