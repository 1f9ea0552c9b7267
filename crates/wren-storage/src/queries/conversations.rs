// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD and state transitions.
//!
//! The partial unique indexes on `conversations` back the per-chat label and
//! single-current rules; the functions here keep `chats.current_conversation_id`
//! in step with `conversations.is_current` inside one transaction.

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use wren_core::types::now_timestamp;
use wren_core::{Conversation, WrenError};

use crate::database::{map_tr_err, Database};

const CONVERSATION_COLUMNS: &str = "id, chat_id, label, archived, is_current, verbose, \
     input_tokens, output_tokens, created_at, updated_at";

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        label: row.get(2)?,
        archived: row.get(3)?,
        is_current: row.get(4)?,
        verbose: row.get(5)?,
        input_tokens: row.get::<_, i64>(6)? as u64,
        output_tokens: row.get::<_, i64>(7)? as u64,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn select_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
        params![id],
        conversation_from_row,
    )
    .optional()
}

/// Clear the current flag on every conversation of the chat.
fn clear_current(tx: &Transaction<'_>, chat_id: &str) -> rusqlite::Result<()> {
    tx.execute(
        "UPDATE conversations SET is_current = 0 WHERE chat_id = ?1 AND is_current = 1",
        params![chat_id],
    )?;
    Ok(())
}

fn point_chat_at(tx: &Transaction<'_>, chat_id: &str, conversation_id: Option<&str>) -> rusqlite::Result<()> {
    tx.execute(
        "UPDATE chats SET current_conversation_id = ?2 WHERE id = ?1",
        params![chat_id, conversation_id],
    )?;
    Ok(())
}

fn insert_conversation(
    tx: &Transaction<'_>,
    chat_id: &str,
    is_current: bool,
) -> rusqlite::Result<Conversation> {
    let now = now_timestamp();
    let conversation = Conversation {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id: chat_id.to_string(),
        label: None,
        archived: false,
        is_current,
        verbose: false,
        input_tokens: 0,
        output_tokens: 0,
        created_at: now.clone(),
        updated_at: now,
    };
    tx.execute(
        "INSERT INTO conversations (id, chat_id, is_current, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            conversation.id,
            conversation.chat_id,
            conversation.is_current,
            conversation.created_at,
            conversation.updated_at,
        ],
    )?;
    Ok(conversation)
}

/// Create a conversation, optionally designating it as the chat's current one.
pub async fn create_conversation(
    db: &Database,
    chat_id: &str,
    make_current: bool,
) -> Result<Conversation, WrenError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if make_current {
                clear_current(&tx, &chat_id)?;
            }
            let conversation = insert_conversation(&tx, &chat_id, make_current)?;
            if make_current {
                point_chat_at(&tx, &chat_id, Some(&conversation.id))?;
            }
            tx.commit()?;
            Ok(conversation)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a conversation by id.
pub async fn get_conversation(db: &Database, id: &str) -> Result<Option<Conversation>, WrenError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_by_id(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Exact label lookup within one chat.
pub async fn find_by_label(
    db: &Database,
    chat_id: &str,
    label: &str,
) -> Result<Option<Conversation>, WrenError> {
    let chat_id = chat_id.to_string();
    let label = label.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE chat_id = ?1 AND label = ?2"
                ),
                params![chat_id, label],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The chat's current conversation, if one is designated.
pub async fn current_conversation(
    db: &Database,
    chat_id: &str,
) -> Result<Option<Conversation>, WrenError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE chat_id = ?1 AND is_current = 1"
                ),
                params![chat_id],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All conversations of a chat, most recently active first.
pub async fn list_conversations(db: &Database, chat_id: &str) -> Result<Vec<Conversation>, WrenError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE chat_id = ?1 ORDER BY updated_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![chat_id], conversation_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Unarchive if needed and make `conversation_id` the chat's only current conversation.
pub async fn set_current(
    db: &Database,
    chat_id: &str,
    conversation_id: &str,
) -> Result<Conversation, WrenError> {
    let chat_id = chat_id.to_string();
    let conversation_id = conversation_id.to_string();
    let missing = conversation_id.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            match select_by_id(&tx, &conversation_id)? {
                Some(existing) if existing.chat_id == chat_id => {}
                _ => return Ok(None),
            }
            clear_current(&tx, &chat_id)?;
            tx.execute(
                "UPDATE conversations SET is_current = 1, archived = 0 WHERE id = ?1",
                params![conversation_id],
            )?;
            point_chat_at(&tx, &chat_id, Some(&conversation_id))?;
            let updated = select_by_id(&tx, &conversation_id)?;
            tx.commit()?;
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)?;
    updated.ok_or_else(|| WrenError::not_found("conversation", missing))
}

/// Set the archived flag. Archiving also drops the current designation.
pub async fn set_archived(db: &Database, conversation_id: &str, archived: bool) -> Result<(), WrenError> {
    let conversation_id = conversation_id.to_string();
    let missing = conversation_id.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = if archived {
                tx.execute(
                    "UPDATE chats SET current_conversation_id = NULL
                     WHERE current_conversation_id = ?1",
                    params![conversation_id],
                )?;
                tx.execute(
                    "UPDATE conversations SET archived = 1, is_current = 0 WHERE id = ?1",
                    params![conversation_id],
                )?
            } else {
                tx.execute(
                    "UPDATE conversations SET archived = 0 WHERE id = ?1",
                    params![conversation_id],
                )?
            };
            tx.commit()?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(WrenError::not_found("conversation", missing));
    }
    Ok(())
}

/// Archive the conversation and designate a fresh replacement, atomically.
pub async fn archive_and_replace(
    db: &Database,
    chat_id: &str,
    conversation_id: &str,
) -> Result<(Conversation, Conversation), WrenError> {
    let chat_id = chat_id.to_string();
    let conversation_id = conversation_id.to_string();
    let missing = conversation_id.clone();
    let result = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            match select_by_id(&tx, &conversation_id)? {
                Some(existing) if existing.chat_id == chat_id => {}
                _ => return Ok(None),
            }
            clear_current(&tx, &chat_id)?;
            tx.execute(
                "UPDATE conversations SET archived = 1 WHERE id = ?1",
                params![conversation_id],
            )?;
            let replacement = insert_conversation(&tx, &chat_id, true)?;
            point_chat_at(&tx, &chat_id, Some(&replacement.id))?;
            let archived = select_by_id(&tx, &conversation_id)?;
            tx.commit()?;
            Ok(archived.map(|archived| (archived, replacement)))
        })
        .await
        .map_err(map_tr_err)?;
    result.ok_or_else(|| WrenError::not_found("conversation", missing))
}

enum LabelUpdate {
    Updated,
    Taken,
    Missing,
}

/// Set or clear a label, refusing labels used by a sibling conversation.
pub async fn set_label(db: &Database, conversation_id: &str, label: Option<&str>) -> Result<(), WrenError> {
    let conversation_id = conversation_id.to_string();
    let missing = conversation_id.clone();
    let label = label.map(str::to_string);
    let taken = label.clone().unwrap_or_default();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(existing) = select_by_id(&tx, &conversation_id)? else {
                return Ok(LabelUpdate::Missing);
            };
            if let Some(label) = &label {
                let clash: Option<String> = tx
                    .query_row(
                        "SELECT id FROM conversations WHERE chat_id = ?1 AND label = ?2 AND id != ?3",
                        params![existing.chat_id, label, conversation_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if clash.is_some() {
                    return Ok(LabelUpdate::Taken);
                }
            }
            tx.execute(
                "UPDATE conversations SET label = ?2 WHERE id = ?1",
                params![conversation_id, label],
            )?;
            tx.commit()?;
            Ok(LabelUpdate::Updated)
        })
        .await
        .map_err(map_tr_err)?;
    match outcome {
        LabelUpdate::Updated => Ok(()),
        LabelUpdate::Taken => Err(WrenError::LabelTaken { label: taken }),
        LabelUpdate::Missing => Err(WrenError::not_found("conversation", missing)),
    }
}

/// Toggle tool-trace rendering for a conversation.
pub async fn set_verbose(db: &Database, conversation_id: &str, verbose: bool) -> Result<(), WrenError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET verbose = ?2 WHERE id = ?1",
                params![conversation_id, verbose],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Add token counts reported by one provider call.
pub async fn add_token_usage(
    db: &Database,
    conversation_id: &str,
    input_tokens: u64,
    output_tokens: u64,
) -> Result<(), WrenError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations
                 SET input_tokens = input_tokens + ?2, output_tokens = output_tokens + ?3
                 WHERE id = ?1",
                params![conversation_id, input_tokens as i64, output_tokens as i64],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
