use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_types::{Role, RoleId};

use crate::error::DbResult;

fn role(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: RoleId::new(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

pub fn insert(conn: &Connection, name: &str, description: Option<&str>) -> DbResult<RoleId> {
    conn.execute(
        "INSERT INTO roles (name, description) VALUES (?1, ?2)",
        params![name, description],
    )?;
    Ok(RoleId::new(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: RoleId) -> DbResult<Option<Role>> {
    let found = conn
        .query_row(
            "SELECT id, name, description FROM roles WHERE id = ?1",
            params![id.get()],
            role,
        )
        .optional()?;
    Ok(found)
}

pub fn find_by_name(conn: &Connection, name: &str) -> DbResult<Option<Role>> {
    let found = conn
        .query_row(
            "SELECT id, name, description FROM roles WHERE name = ?1",
            params![name],
            role,
        )
        .optional()?;
    Ok(found)
}

/// All roles, built-in ones first.
pub fn list(conn: &Connection) -> DbResult<Vec<Role>> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM roles ORDER BY id")?;
    let roles = stmt.query_map([], role)?.collect::<Result<Vec<_>, _>>()?;
    Ok(roles)
}
