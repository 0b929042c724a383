use rusqlite::{params, Connection, OptionalExtension, Row};
use shelf_types::{RoleId, User, UserId};

use crate::error::DbResult;
use crate::rows;

const USER_SELECT: &str = "SELECT users.id, users.login, users.last_name, users.first_name, \
     users.middle_name, users.role_id, roles.name, users.password_hash \
     FROM users JOIN roles ON roles.id = users.role_id";

/// Row to insert into `users`. The password is already hashed.
#[derive(Clone, Debug)]
pub struct NewUserRow<'a> {
    pub login: &'a str,
    pub password_hash: &'a str,
    pub last_name: &'a str,
    pub first_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub role_id: RoleId,
}

fn user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        login: row.get(1)?,
        last_name: row.get(2)?,
        first_name: row.get(3)?,
        middle_name: row.get(4)?,
        role_id: RoleId::new(row.get(5)?),
        role_name: row.get(6)?,
    })
}

pub fn insert(conn: &Connection, new: &NewUserRow<'_>) -> DbResult<UserId> {
    conn.execute(
        "INSERT INTO users (login, password_hash, last_name, first_name, middle_name, role_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.login,
            new.password_hash,
            new.last_name,
            new.first_name,
            new.middle_name,
            new.role_id.get(),
            chrono::Utc::now().timestamp_millis(),
        ],
    )?;
    Ok(UserId::new(conn.last_insert_rowid()))
}

pub fn get(conn: &Connection, id: UserId) -> DbResult<Option<User>> {
    let found = conn
        .query_row(
            &format!("{USER_SELECT} WHERE users.id = ?1"),
            params![id.get()],
            user,
        )
        .optional()?;
    Ok(found)
}

/// The user with `login` together with their stored password hash.
pub fn credentials(conn: &Connection, login: &str) -> DbResult<Option<(User, String)>> {
    let found = conn
        .query_row(
            &format!("{USER_SELECT} WHERE users.login = ?1"),
            params![login],
            |row| Ok((user(row)?, row.get(7)?)),
        )
        .optional()?;
    Ok(found)
}

pub fn count(conn: &Connection) -> DbResult<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(rows::count(n))
}

/// Delete a user; reviews and collections go with it. Returns whether a row existed.
pub fn delete(conn: &Connection, id: UserId) -> DbResult<bool> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", params![id.get()])?;
    Ok(n > 0)
}
