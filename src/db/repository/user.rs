use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::{Role, User, UserRecord};

const USER_COLUMNS: &str = "id, username, role, created_at, password_hash";

type UserRow = (i64, String, String, DateTime<Utc>, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn record_from_row(row: UserRow) -> Result<UserRecord, DatabaseError> {
    let (id, username, role, created_at, password_hash) = row;
    Ok(UserRecord {
        user: User {
            id,
            username,
            role: Role::from_str(&role)?,
            created_at,
        },
        password_hash,
    })
}

/// Insert an account. A taken username is a `ConstraintViolation`.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, DatabaseError> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO users (username, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![username, password_hash, role.as_str(), created_at],
    )
    .map_err(|e| DatabaseError::from_insert(e, "username already exists"))?;

    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        role,
        created_at,
    })
}

/// Exact, case-sensitive username lookup.
pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            read_row,
        )
        .optional()?;
    row.map(record_from_row).transpose()
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<UserRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(record_from_row).transpose()
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|row| record_from_row(row).map(|r| r.user))
        .collect()
}

pub fn update_password_hash(
    conn: &Connection,
    id: i64,
    password_hash: &str,
) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE id = ?1",
        params![id, password_hash],
    )?;
    Ok(rows_affected > 0)
}

pub fn delete_user(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(rows_affected > 0)
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_admins(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'admin'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
