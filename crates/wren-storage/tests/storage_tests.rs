// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite storage adapter.

use tempfile::TempDir;
use wren_config::model::StorageConfig;
use wren_core::{NewMessage, Role, StorageAdapter, ToolCall, WrenError};
use wren_storage::SqliteStorage;

async fn open() -> (SqliteStorage, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
    });
    storage.initialize().await.unwrap();
    (storage, dir)
}

#[tokio::test]
async fn chat_identity_is_channel_and_external_id() {
    let (storage, _dir) = open().await;
    let a = storage.get_or_create_chat("telegram", "42").await.unwrap();
    let again = storage.get_or_create_chat("telegram", "42").await.unwrap();
    let other = storage.get_or_create_chat("cli", "42").await.unwrap();

    assert_eq!(a.id, again.id);
    assert_ne!(a.id, other.id);
    assert!(a.current_conversation_id.is_none());
}

#[tokio::test]
async fn creating_current_conversation_clears_previous() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let first = storage.create_conversation(&chat.id, true).await.unwrap();
    let second = storage.create_conversation(&chat.id, true).await.unwrap();

    let all = storage.list_conversations(&chat.id).await.unwrap();
    let current: Vec<_> = all.iter().filter(|c| c.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, second.id);
    assert!(!storage.get_conversation(&first.id).await.unwrap().unwrap().is_current);

    let chat = storage.get_chat(&chat.id).await.unwrap().unwrap();
    assert_eq!(chat.current_conversation_id.as_deref(), Some(second.id.as_str()));
}

#[tokio::test]
async fn set_current_unarchives() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let old = storage.create_conversation(&chat.id, false).await.unwrap();
    storage.create_conversation(&chat.id, true).await.unwrap();
    storage.set_archived(&old.id, true).await.unwrap();

    let switched = storage.set_current_conversation(&chat.id, &old.id).await.unwrap();
    assert!(switched.is_current);
    assert!(!switched.archived);
}

#[tokio::test]
async fn set_current_rejects_foreign_conversation() {
    let (storage, _dir) = open().await;
    let mine = storage.get_or_create_chat("cli", "me").await.unwrap();
    let theirs = storage.get_or_create_chat("cli", "them").await.unwrap();
    let foreign = storage.create_conversation(&theirs.id, true).await.unwrap();

    let err = storage
        .set_current_conversation(&mine.id, &foreign.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WrenError::NotFound { .. }));
}

#[tokio::test]
async fn archive_and_replace_is_atomic() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let current = storage.create_conversation(&chat.id, true).await.unwrap();

    let (archived, replacement) = storage
        .archive_and_replace(&chat.id, &current.id)
        .await
        .unwrap();
    assert_eq!(archived.id, current.id);
    assert!(archived.archived);
    assert!(!archived.is_current);
    assert!(replacement.is_current);
    assert_ne!(replacement.id, current.id);

    let now_current = storage.current_conversation(&chat.id).await.unwrap().unwrap();
    assert_eq!(now_current.id, replacement.id);
}

#[tokio::test]
async fn labels_are_unique_per_chat_only() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let a = storage.create_conversation(&chat.id, true).await.unwrap();
    let b = storage.create_conversation(&chat.id, false).await.unwrap();

    storage.set_label(&a.id, Some("work")).await.unwrap();
    let err = storage.set_label(&b.id, Some("work")).await.unwrap_err();
    assert!(matches!(err, WrenError::LabelTaken { ref label } if label == "work"));

    // Re-setting the same label on the owner is fine.
    storage.set_label(&a.id, Some("work")).await.unwrap();

    let other_chat = storage.get_or_create_chat("cli", "other").await.unwrap();
    let c = storage.create_conversation(&other_chat.id, true).await.unwrap();
    storage.set_label(&c.id, Some("work")).await.unwrap();

    let found = storage
        .find_conversation_by_label(&other_chat.id, "work")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, c.id);
}

#[tokio::test]
async fn messages_append_in_order_and_bump_activity() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let older = storage.create_conversation(&chat.id, false).await.unwrap();
    let newer = storage.create_conversation(&chat.id, true).await.unwrap();

    storage
        .append_message(&older.id, NewMessage::user("hello"))
        .await
        .unwrap();
    let call = ToolCall {
        id: "call_1".into(),
        name: "shell".into(),
        input: serde_json::json!({"command": "ls"}),
    };
    storage
        .append_message(&older.id, NewMessage::tool_request("", call.clone()))
        .await
        .unwrap();
    storage
        .append_message(&older.id, NewMessage::observation("call_1", "Cargo.toml", false))
        .await
        .unwrap();

    let messages = storage.list_messages(&older.id).await.unwrap();
    let seqs: Vec<i64> = messages.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(messages[1].tool_call.as_ref(), Some(&call));
    assert_eq!(messages[2].role, Role::Tool);
    assert_eq!(messages[2].tool_call_id.as_deref(), Some("call_1"));

    // Most recent activity first.
    let listed = storage.list_conversations(&chat.id).await.unwrap();
    assert_eq!(listed[0].id, older.id);
    assert_eq!(listed[1].id, newer.id);
}

#[tokio::test]
async fn replace_prefix_keeps_suffix_order() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let conv = storage.create_conversation(&chat.id, true).await.unwrap();
    for i in 0..12 {
        storage
            .append_message(&conv.id, NewMessage::user(format!("m{i}")))
            .await
            .unwrap();
    }

    storage
        .replace_message_prefix(&conv.id, 7, "summary")
        .await
        .unwrap();

    let messages = storage.list_messages(&conv.id).await.unwrap();
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, "summary");
    let rest: Vec<&str> = messages[1..].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(rest, vec!["m7", "m8", "m9", "m10", "m11"]);

    // Appends continue after the retained suffix.
    let next = storage
        .append_message(&conv.id, NewMessage::user("m12"))
        .await
        .unwrap();
    assert_eq!(next.seq, 13);
}

#[tokio::test]
async fn token_usage_accumulates() {
    let (storage, _dir) = open().await;
    let chat = storage.get_or_create_chat("cli", "local").await.unwrap();
    let conv = storage.create_conversation(&chat.id, true).await.unwrap();
    storage.add_token_usage(&conv.id, 100, 20).await.unwrap();
    storage.add_token_usage(&conv.id, 50, 5).await.unwrap();
    storage.set_verbose(&conv.id, true).await.unwrap();

    let conv = storage.get_conversation(&conv.id).await.unwrap().unwrap();
    assert_eq!(conv.input_tokens, 150);
    assert_eq!(conv.output_tokens, 25);
    assert!(conv.verbose);
}
