// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message append, listing and compaction.

use std::str::FromStr;

use rusqlite::{params, Row};
use wren_core::types::now_timestamp;
use wren_core::{Message, NewMessage, Role, ToolCall, WrenError};

use crate::database::{map_tr_err, Database};
use crate::queries::conversion_error;

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, seq, role, content, tool_call, tool_call_id, is_error, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(3)?;
    let role = Role::from_str(&role).map_err(|e| conversion_error(3, e))?;
    let tool_call: Option<String> = row.get(5)?;
    let tool_call = tool_call
        .map(|json| serde_json::from_str::<ToolCall>(&json))
        .transpose()
        .map_err(|e| conversion_error(5, e))?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        seq: row.get(2)?,
        role,
        content: row.get(4)?,
        tool_call,
        tool_call_id: row.get(6)?,
        is_error: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Append a message after the current last one and bump the conversation's activity time.
pub async fn append_message(
    db: &Database,
    conversation_id: &str,
    message: NewMessage,
) -> Result<Message, WrenError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let tool_call = message
                .tool_call
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

            let tx = conn.transaction()?;
            let seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )?;
            let stored = Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: conversation_id.clone(),
                seq,
                role: message.role,
                content: message.content,
                tool_call: message.tool_call,
                tool_call_id: message.tool_call_id,
                is_error: message.is_error,
                created_at: now_timestamp(),
            };
            tx.execute(
                &format!(
                    "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    stored.id,
                    stored.conversation_id,
                    stored.seq,
                    stored.role.to_string(),
                    stored.content,
                    tool_call,
                    stored.tool_call_id,
                    stored.is_error,
                    stored.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
                params![conversation_id, stored.created_at],
            )?;
            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(map_tr_err)
}

/// All messages of a conversation in insertion order.
pub async fn list_messages(db: &Database, conversation_id: &str) -> Result<Vec<Message>, WrenError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1 ORDER BY seq ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the first `count` messages with a single system summary.
///
/// The summary takes the sequence number of the last removed message, so it
/// sorts before every retained message.
pub async fn replace_prefix(
    db: &Database,
    conversation_id: &str,
    count: usize,
    summary: &str,
) -> Result<(), WrenError> {
    if count == 0 {
        return Err(WrenError::InvalidOperation(
            "nothing to compact: prefix is empty".into(),
        ));
    }
    let conversation_id = conversation_id.to_string();
    let summary = summary.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let last_seq: Option<i64> = tx.query_row(
                "SELECT MAX(seq) FROM (
                     SELECT seq FROM messages WHERE conversation_id = ?1 ORDER BY seq ASC LIMIT ?2
                 )",
                params![conversation_id, count as i64],
                |row| row.get(0),
            )?;
            let Some(last_seq) = last_seq else {
                return Ok(());
            };
            tx.execute(
                "DELETE FROM messages WHERE conversation_id = ?1 AND seq <= ?2",
                params![conversation_id, last_seq],
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, 0, ?6)"
                ),
                params![
                    uuid::Uuid::new_v4().to_string(),
                    conversation_id,
                    last_seq,
                    Role::System.to_string(),
                    summary,
                    now_timestamp(),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
