// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation management commands.

use async_trait::async_trait;
use wren_core::{Conversation, WrenError};

use super::{Command, CommandContext};
use crate::conversation::{ArchiveOutcome, ListFilter};

pub struct NewCommand;

#[async_trait]
impl Command for NewCommand {
    fn name(&self) -> &str {
        "new"
    }

    fn description(&self) -> &str {
        "Start a new conversation"
    }

    async fn execute(&self, _args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let created = ctx.manager.create_new(&ctx.chat).await?;
        let reply = format!("Started a new conversation ({}).", created.display_name());
        ctx.conversation = created;
        Ok(reply)
    }
}

pub struct SwitchCommand;

#[async_trait]
impl Command for SwitchCommand {
    fn name(&self) -> &str {
        "switch"
    }

    fn description(&self) -> &str {
        "Switch to a conversation by label or id"
    }

    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let target = ctx.manager.switch(&ctx.chat, args).await?;
        let reply = format!("Switched to {}.", target.display_name());
        ctx.conversation = target;
        Ok(reply)
    }
}

pub struct ArchiveCommand;

#[async_trait]
impl Command for ArchiveCommand {
    fn name(&self) -> &str {
        "archive"
    }

    fn description(&self) -> &str {
        "Archive the current conversation, or another one by label or id"
    }

    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let identifier = (!args.is_empty()).then_some(args);
        match ctx.manager.archive(&ctx.chat, identifier).await? {
            ArchiveOutcome::Archived(archived) => {
                Ok(format!("Archived {}.", archived.display_name()))
            }
            ArchiveOutcome::Replaced {
                archived,
                new_conversation,
            } => {
                let reply = format!(
                    "Archived {}. Started a new conversation ({}).",
                    archived.display_name(),
                    new_conversation.display_name()
                );
                ctx.conversation = new_conversation;
                Ok(reply)
            }
        }
    }
}

pub struct LabelCommand;

#[async_trait]
impl Command for LabelCommand {
    fn name(&self) -> &str {
        "label"
    }

    fn description(&self) -> &str {
        "Name the current conversation"
    }

    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let labelled = ctx.manager.set_label(&ctx.conversation.id, args).await?;
        let reply = format!("Labelled this conversation '{}'.", labelled.display_name());
        ctx.conversation = labelled;
        Ok(reply)
    }
}

pub struct ListCommand;

#[async_trait]
impl Command for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List conversations (add 'all' or 'archived')"
    }

    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let filter = match args.to_ascii_lowercase().as_str() {
            "" => ListFilter::Active,
            "all" => ListFilter::All,
            "archived" => ListFilter::ArchivedOnly,
            _ => return Err(WrenError::Usage("Usage: /list [all|archived]".into())),
        };
        let conversations = ctx.manager.list(&ctx.chat, filter).await?;
        if conversations.is_empty() {
            return Ok(match filter {
                ListFilter::ArchivedOnly => "No archived conversations.".into(),
                _ => "No conversations yet.".into(),
            });
        }
        Ok(conversations
            .iter()
            .map(list_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn list_line(c: &Conversation) -> String {
    let marker = if c.is_current { "*" } else { " " };
    let short_id = c.id.get(..8).unwrap_or(&c.id);
    let mut line = match &c.label {
        Some(label) => format!("{marker} {label} ({short_id})"),
        None => format!("{marker} {short_id}"),
    };
    if c.archived {
        line.push_str(" [archived]");
    }
    line.push_str(&format!(" - updated {}", c.updated_at.get(..16).unwrap_or(&c.updated_at)));
    line
}

pub struct CompactCommand;

#[async_trait]
impl Command for CompactCommand {
    fn name(&self) -> &str {
        "compact"
    }

    fn description(&self) -> &str {
        "Summarize older messages, keeping the most recent N"
    }

    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let keep = if args.is_empty() {
            ctx.manager.compaction_config().keep_recent
        } else {
            args.parse::<usize>()
                .map_err(|_| WrenError::Usage("Usage: /compact [number of messages to keep]".into()))?
        };
        let outcome = ctx.manager.compact(&ctx.conversation.id, keep).await?;
        Ok(format!(
            "Compacted {} messages into a summary; kept the last {}.",
            outcome.summarized, outcome.kept
        ))
    }
}
