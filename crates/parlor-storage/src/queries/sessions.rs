// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations.

use parlor_core::types::Session;
use parlor_core::ParlorError;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;

/// Title given to sessions created without one.
pub const DEFAULT_TITLE: &str = "New Chat";

const SESSION_COLUMNS: &str = "id, owner_id, title, created_at, updated_at";

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Looks up a session only if `owner` owns it.
///
/// Runs on the connection thread so callers can combine it with writes in
/// one transaction.
pub(crate) fn owned_session(
    conn: &rusqlite::Connection,
    owner: &str,
    session_id: i64,
) -> rusqlite::Result<Option<Session>> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 AND owner_id = ?2"),
        params![session_id, owner],
        row_to_session,
    )
    .optional()
}

/// Create a new session for `owner`.
pub async fn create_session(
    db: &Database,
    owner: &str,
    title: Option<&str>,
) -> Result<Session, ParlorError> {
    let owner = owner.to_string();
    let title = title.unwrap_or(DEFAULT_TITLE).to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Session> {
            conn.execute(
                "INSERT INTO sessions (owner_id, title) VALUES (?1, ?2)",
                params![owner, title],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by ID, if owned by `owner`.
pub async fn get_session(
    db: &Database,
    owner: &str,
    session_id: i64,
) -> Result<Option<Session>, ParlorError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| owned_session(conn, &owner, session_id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the owner's sessions, most recently updated first.
pub async fn list_sessions(db: &Database, owner: &str) -> Result<Vec<Session>, ParlorError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<Session>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE owner_id = ?1
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![owner], row_to_session)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Rename a session and bump its `updated_at`. `None` if not owned.
pub async fn rename_session(
    db: &Database,
    owner: &str,
    session_id: i64,
    title: &str,
) -> Result<Option<Session>, ParlorError> {
    let owner = owner.to_string();
    let title = title.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Session>> {
            let changed = conn.execute(
                "UPDATE sessions
                 SET title = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND owner_id = ?3",
                params![title, session_id, owner],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            owned_session(conn, &owner, session_id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
