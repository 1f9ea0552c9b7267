// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle per chat: current designation, switching,
//! archiving, labels, listing and compaction.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::info;
use wren_config::model::CompactionConfig;
use wren_core::{Chat, Conversation, ProviderAdapter, StorageAdapter, WrenError};

use crate::compaction;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("label pattern is a valid regex"));

const MAX_LABEL_LEN: usize = 64;

/// Minimum length of an id prefix accepted when resolving conversations.
const MIN_ID_PREFIX: usize = 4;

/// Which conversations `list` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    Active,
    All,
    ArchivedOnly,
}

/// What an archive request did.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    /// A non-current conversation was archived.
    Archived(Conversation),
    /// The current conversation was archived and a fresh one designated.
    Replaced {
        archived: Conversation,
        new_conversation: Conversation,
    },
}

/// Result of compacting a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionOutcome {
    /// Messages folded into the summary.
    pub summarized: usize,
    /// Messages kept verbatim after it.
    pub kept: usize,
}

pub struct ConversationManager {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    compaction: CompactionConfig,
}

impl ConversationManager {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        compaction: CompactionConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            compaction,
        }
    }

    pub fn compaction_config(&self) -> &CompactionConfig {
        &self.compaction
    }

    /// The chat for a channel identity, created on first contact.
    pub async fn chat_for(&self, channel: &str, external_id: &str) -> Result<Chat, WrenError> {
        self.storage.get_or_create_chat(channel, external_id).await
    }

    /// The chat's current conversation, creating one if there is none.
    pub async fn current_for(&self, chat: &Chat) -> Result<Conversation, WrenError> {
        if let Some(current) = self.storage.current_conversation(&chat.id).await?
            && !current.archived
        {
            return Ok(current);
        }
        let created = self.storage.create_conversation(&chat.id, true).await?;
        info!(chat_id = %chat.id, conversation_id = %created.id, "created conversation");
        Ok(created)
    }

    /// Makes the conversation named by `identifier` current, unarchiving it
    /// if needed.
    pub async fn switch(&self, chat: &Chat, identifier: &str) -> Result<Conversation, WrenError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(WrenError::Usage("Usage: /switch <label or id>".into()));
        }
        let target = self.resolve(chat, identifier).await?;
        let current = self
            .storage
            .set_current_conversation(&chat.id, &target.id)
            .await?;
        info!(chat_id = %chat.id, conversation_id = %current.id, "switched conversation");
        Ok(current)
    }

    /// Creates a conversation and makes it current.
    pub async fn create_new(&self, chat: &Chat) -> Result<Conversation, WrenError> {
        let created = self.storage.create_conversation(&chat.id, true).await?;
        info!(chat_id = %chat.id, conversation_id = %created.id, "started new conversation");
        Ok(created)
    }

    /// Archives a conversation.
    ///
    /// With an identifier, the named conversation is archived; it must not be
    /// the current one. Without one, the current conversation is archived and
    /// replaced by a fresh current conversation in one step.
    pub async fn archive(
        &self,
        chat: &Chat,
        identifier: Option<&str>,
    ) -> Result<ArchiveOutcome, WrenError> {
        match identifier.map(str::trim).filter(|s| !s.is_empty()) {
            Some(identifier) => {
                let target = self.resolve(chat, identifier).await?;
                if target.is_current {
                    return Err(WrenError::InvalidOperation(format!(
                        "'{}' is the current conversation. Use /archive without an argument to archive it and start a new one.",
                        target.display_name()
                    )));
                }
                if target.archived {
                    return Err(WrenError::InvalidOperation(format!(
                        "'{}' is already archived.",
                        target.display_name()
                    )));
                }
                self.storage.set_archived(&target.id, true).await?;
                let archived = self.get(&target.id).await?;
                info!(chat_id = %chat.id, conversation_id = %archived.id, "archived conversation");
                Ok(ArchiveOutcome::Archived(archived))
            }
            None => {
                let current = self.current_for(chat).await?;
                let (archived, new_conversation) = self
                    .storage
                    .archive_and_replace(&chat.id, &current.id)
                    .await?;
                info!(
                    chat_id = %chat.id,
                    archived = %archived.id,
                    current = %new_conversation.id,
                    "archived current conversation"
                );
                Ok(ArchiveOutcome::Replaced {
                    archived,
                    new_conversation,
                })
            }
        }
    }

    /// Labels a conversation. Labels are unique within a chat; setting the
    /// label a conversation already has is a no-op.
    pub async fn set_label(
        &self,
        conversation_id: &str,
        label: &str,
    ) -> Result<Conversation, WrenError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(WrenError::Usage("Usage: /label <name>".into()));
        }
        if label.len() > MAX_LABEL_LEN || !LABEL_RE.is_match(label) {
            return Err(WrenError::InvalidFormat(format!(
                "Invalid label '{label}'. Use up to {MAX_LABEL_LEN} letters, digits, '_' or '-'."
            )));
        }

        let conversation = self.get(conversation_id).await?;
        if conversation.label.as_deref() == Some(label) {
            return Ok(conversation);
        }
        self.storage.set_label(conversation_id, Some(label)).await?;
        self.get(conversation_id).await
    }

    pub async fn set_verbose(
        &self,
        conversation_id: &str,
        verbose: bool,
    ) -> Result<Conversation, WrenError> {
        self.storage.set_verbose(conversation_id, verbose).await?;
        self.get(conversation_id).await
    }

    /// Conversations of the chat, most recently active first.
    pub async fn list(&self, chat: &Chat, filter: ListFilter) -> Result<Vec<Conversation>, WrenError> {
        let all = self.storage.list_conversations(&chat.id).await?;
        Ok(all
            .into_iter()
            .filter(|c| match filter {
                ListFilter::Active => !c.archived,
                ListFilter::All => true,
                ListFilter::ArchivedOnly => c.archived,
            })
            .collect())
    }

    /// Replaces all but the last `keep_recent` messages with a summary.
    pub async fn compact(
        &self,
        conversation_id: &str,
        keep_recent: usize,
    ) -> Result<CompactionOutcome, WrenError> {
        let messages = self.storage.list_messages(conversation_id).await?;
        let total = messages.len();
        if total < self.compaction.min_messages {
            return Err(WrenError::InvalidOperation(format!(
                "Nothing to compact: this conversation has {total} messages, at least {} are needed.",
                self.compaction.min_messages
            )));
        }
        // The summary itself takes one slot, so folding a single message gains nothing.
        let prefix = total.saturating_sub(keep_recent);
        if prefix < 2 {
            return Err(WrenError::InvalidOperation(format!(
                "Nothing to compact: keeping {keep_recent} of {total} messages leaves too little to summarize."
            )));
        }

        let (summary, usage) =
            compaction::summarize(self.provider.as_ref(), &messages[..prefix], "").await?;
        self.storage
            .replace_message_prefix(conversation_id, prefix, &summary)
            .await?;
        self.storage
            .add_token_usage(conversation_id, usage.input_tokens, usage.output_tokens)
            .await?;

        info!(conversation_id, summarized = prefix, kept = total - prefix, "compacted conversation");
        Ok(CompactionOutcome {
            summarized: prefix,
            kept: total - prefix,
        })
    }

    /// Finds a conversation of `chat` by exact label, then exact id, then
    /// case-insensitively by label, id, or a unique id prefix.
    pub async fn resolve(&self, chat: &Chat, identifier: &str) -> Result<Conversation, WrenError> {
        if let Some(found) = self
            .storage
            .find_conversation_by_label(&chat.id, identifier)
            .await?
        {
            return Ok(found);
        }
        if let Some(found) = self.storage.get_conversation(identifier).await?
            && found.chat_id == chat.id
        {
            return Ok(found);
        }

        let lowered = identifier.to_lowercase();
        let candidates = self.storage.list_conversations(&chat.id).await?;
        if let Some(found) = candidates.iter().find(|c| {
            c.label.as_deref().is_some_and(|l| l.to_lowercase() == lowered)
                || c.id.to_lowercase() == lowered
        }) {
            return Ok(found.clone());
        }
        if lowered.len() >= MIN_ID_PREFIX {
            let mut prefixed = candidates
                .iter()
                .filter(|c| c.id.to_lowercase().starts_with(&lowered));
            if let (Some(found), None) = (prefixed.next(), prefixed.next()) {
                return Ok(found.clone());
            }
        }

        Err(WrenError::not_found("conversation", identifier))
    }

    pub async fn get(&self, conversation_id: &str) -> Result<Conversation, WrenError> {
        self.storage
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| WrenError::not_found("conversation", conversation_id))
    }
}
