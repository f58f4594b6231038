// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations.

use std::str::FromStr;

use parlor_core::types::{Message, NewMessage, Role};
use parlor_core::ParlorError;
use rusqlite::params;

use crate::database::Database;
use crate::queries::sessions::owned_session;

const MESSAGE_COLUMNS: &str =
    "id, session_id, role, content, tool_name, tool_output, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let role = Role::from_str(&role).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role,
        content: row.get(3)?,
        tool_name: row.get(4)?,
        tool_output: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append messages to an owned session in one transaction.
///
/// Returns `None` (and writes nothing) when the session is not owned by
/// `owner`. The session's `updated_at` is advanced on success.
pub async fn append_messages(
    db: &Database,
    owner: &str,
    session_id: i64,
    messages: Vec<NewMessage>,
) -> Result<Option<Vec<Message>>, ParlorError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Vec<Message>>> {
            let tx = conn.transaction()?;
            if owned_session(&tx, &owner, session_id)?.is_none() {
                return Ok(None);
            }

            let mut stored = Vec::with_capacity(messages.len());
            for message in messages {
                let (tool_name, tool_output) = match message.tool {
                    Some(tool) => (Some(tool.name), Some(tool.output)),
                    None => (None, None),
                };
                tx.execute(
                    "INSERT INTO messages (session_id, role, content, tool_name, tool_output)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        session_id,
                        message.role.to_string(),
                        message.content,
                        tool_name,
                        tool_output,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                stored.push(tx.query_row(
                    &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                    params![id],
                    row_to_message,
                )?);
            }

            tx.execute(
                "UPDATE sessions SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![session_id],
            )?;
            tx.commit()?;
            Ok(Some(stored))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of an owned session in creation order. `None` if not owned.
pub async fn list_messages(
    db: &Database,
    owner: &str,
    session_id: i64,
) -> Result<Option<Vec<Message>>, ParlorError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Vec<Message>>> {
            if owned_session(conn, &owner, session_id)?.is_none() {
                return Ok(None);
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![session_id], row_to_message)?;
            let messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Some(messages))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
