// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for conversation persistence.

use async_trait::async_trait;

use crate::error::WrenError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Chat, Conversation, Message, NewMessage};

/// Persistence for chats, conversations and their messages.
///
/// Multi-record state transitions (`set_current_conversation`,
/// `archive_and_replace`, `replace_message_prefix`) must be atomic.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), WrenError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WrenError>;

    // --- Chats ---

    /// Returns the chat for `(channel, external_id)`, creating it on first contact.
    async fn get_or_create_chat(&self, channel: &str, external_id: &str)
    -> Result<Chat, WrenError>;

    async fn get_chat(&self, id: &str) -> Result<Option<Chat>, WrenError>;

    // --- Conversations ---

    /// Creates a conversation; when `make_current` is set it becomes the
    /// chat's only current conversation.
    async fn create_conversation(
        &self,
        chat_id: &str,
        make_current: bool,
    ) -> Result<Conversation, WrenError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, WrenError>;

    /// The chat's conversation with exactly this label, if any.
    async fn find_conversation_by_label(
        &self,
        chat_id: &str,
        label: &str,
    ) -> Result<Option<Conversation>, WrenError>;

    /// The conversation currently designated for the chat.
    async fn current_conversation(&self, chat_id: &str)
    -> Result<Option<Conversation>, WrenError>;

    /// All conversations of a chat, most recently active first.
    async fn list_conversations(&self, chat_id: &str) -> Result<Vec<Conversation>, WrenError>;

    /// Unarchives the conversation if needed and makes it the chat's only
    /// current conversation.
    async fn set_current_conversation(
        &self,
        chat_id: &str,
        conversation_id: &str,
    ) -> Result<Conversation, WrenError>;

    async fn set_archived(&self, conversation_id: &str, archived: bool) -> Result<(), WrenError>;

    /// Archives `conversation_id` and designates a freshly created
    /// replacement, returning `(archived, replacement)`.
    async fn archive_and_replace(
        &self,
        chat_id: &str,
        conversation_id: &str,
    ) -> Result<(Conversation, Conversation), WrenError>;

    /// Sets or clears a label. Fails with `LabelTaken` when another
    /// conversation of the same chat already uses it.
    async fn set_label(&self, conversation_id: &str, label: Option<&str>)
    -> Result<(), WrenError>;

    async fn set_verbose(&self, conversation_id: &str, verbose: bool) -> Result<(), WrenError>;

    async fn add_token_usage(
        &self,
        conversation_id: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<(), WrenError>;

    // --- Messages ---

    /// Appends a message at the end of the conversation.
    async fn append_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Message, WrenError>;

    /// All messages in order.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, WrenError>;

    /// Replaces the first `count` messages with one system summary message,
    /// keeping the rest in their original order.
    async fn replace_message_prefix(
        &self,
        conversation_id: &str,
        count: usize,
        summary: &str,
    ) -> Result<(), WrenError>;
}
