// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat lookups.

use rusqlite::{params, OptionalExtension, Row};
use wren_core::types::now_timestamp;
use wren_core::{Chat, WrenError};

use crate::database::Database;

const CHAT_COLUMNS: &str = "id, channel, external_id, current_conversation_id, created_at";

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        channel: row.get(1)?,
        external_id: row.get(2)?,
        current_conversation_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Fetch the chat for `(channel, external_id)`, inserting it on first contact.
pub async fn get_or_create_chat(
    db: &Database,
    channel: &str,
    external_id: &str,
) -> Result<Chat, WrenError> {
    let channel = channel.to_string();
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO chats (id, channel, external_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    channel,
                    external_id,
                    now_timestamp()
                ],
            )?;
            conn.query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE channel = ?1 AND external_id = ?2"),
                params![channel, external_id],
                chat_from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a chat by id.
pub async fn get_chat(db: &Database, id: &str) -> Result<Option<Chat>, WrenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1"),
                params![id],
                chat_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
