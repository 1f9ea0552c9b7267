// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command directives.
//!
//! A message is a command when it starts with `/` followed by a registered
//! name, e.g. `/switch work`. Telegram-style `@botname` suffixes on the name
//! are ignored and names match case-insensitively.

mod conversation;
mod session;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use wren_core::{Chat, Conversation, WrenError};

use crate::conversation::ConversationManager;
use crate::run::ActiveRuns;

pub use conversation::{
    ArchiveCommand, CompactCommand, LabelCommand, ListCommand, NewCommand, SwitchCommand,
};
pub use session::{HelpCommand, StatusCommand, StopCommand, VerboseCommand};

/// State a command handler may read and update.
///
/// Handlers that change the chat's current conversation replace
/// `conversation` so the caller sees the new one.
pub struct CommandContext {
    pub chat: Chat,
    pub conversation: Conversation,
    pub user_id: String,
    pub manager: Arc<ConversationManager>,
    pub runs: ActiveRuns,
    /// `(name, summary)` of every registered command, filled in on dispatch.
    pub available: Vec<(String, String)>,
}

/// A named directive handler.
#[async_trait]
pub trait Command: Send + Sync {
    /// Name without the leading slash, lowercase.
    fn name(&self) -> &str;

    /// One-line summary shown by `/help`.
    fn description(&self) -> &str;

    /// Runs the command with everything after its name.
    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError>;
}

/// A parsed `/name args` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: String,
    pub args: &'a str,
}

/// Splits `/name args`. Returns `None` when the text is not command-shaped.
pub fn parse(text: &str) -> Option<ParsedCommand<'_>> {
    let rest = text.trim().strip_prefix('/')?;
    let (token, args) = match rest.split_once(char::is_whitespace) {
        Some((token, args)) => (token, args.trim()),
        None => (rest, ""),
    };
    let name = token.split('@').next().unwrap_or(token).to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    Some(ParsedCommand { name, args })
}

/// Commands indexed by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in command.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn Command>; 10] = [
            Arc::new(HelpCommand),
            Arc::new(NewCommand),
            Arc::new(SwitchCommand),
            Arc::new(ArchiveCommand),
            Arc::new(LabelCommand),
            Arc::new(ListCommand),
            Arc::new(CompactCommand),
            Arc::new(VerboseCommand),
            Arc::new(StopCommand),
            Arc::new(StatusCommand),
        ];
        for command in builtins {
            registry.register(command);
        }
        registry
    }

    /// Registers a command. The first registration of a name wins.
    pub fn register(&mut self, command: Arc<dyn Command>) -> bool {
        let name = command.name().to_ascii_lowercase();
        if self.commands.contains_key(&name) {
            debug!(command = %name, "command already registered, keeping existing");
            return false;
        }
        self.commands.insert(name, command);
        true
    }

    /// True when `text` is `/name ...` for a registered name.
    pub fn is_command(&self, text: &str) -> bool {
        parse(text).is_some_and(|p| self.commands.contains_key(&p.name))
    }

    /// Registered `(name, summary)` pairs in name order.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.commands
            .iter()
            .map(|(name, c)| (name.clone(), c.description().to_string()))
            .collect()
    }

    /// Dispatches `text` and returns the reply.
    ///
    /// Unknown commands get a standard hint. User-correctable errors are
    /// rendered as their message; other failures are logged and reported
    /// generically.
    pub async fn execute(&self, text: &str, ctx: &mut CommandContext) -> String {
        let Some(parsed) = parse(text) else {
            return unknown_command(text.trim());
        };
        let Some(command) = self.commands.get(&parsed.name) else {
            return unknown_command(&format!("/{}", parsed.name));
        };

        ctx.available = self.describe();
        debug!(command = %parsed.name, chat_id = %ctx.chat.id, "executing command");
        match command.execute(parsed.args, ctx).await {
            Ok(reply) => reply,
            Err(e) if e.is_user_facing() => e.to_string(),
            Err(e) => {
                warn!(command = %parsed.name, error = %e, "command failed");
                format!("Error: {e}")
            }
        }
    }
}

fn unknown_command(name: &str) -> String {
    format!("Unknown command: {name}. Type /help for available commands.")
}
