// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Help, run control and per-conversation settings.

use async_trait::async_trait;
use wren_core::WrenError;

use super::{Command, CommandContext};

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands"
    }

    async fn execute(&self, _args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let mut lines = vec!["Available commands:".to_string()];
        lines.extend(
            ctx.available
                .iter()
                .map(|(name, description)| format!("/{name} - {description}")),
        );
        Ok(lines.join("\n"))
    }
}

pub struct VerboseCommand;

#[async_trait]
impl Command for VerboseCommand {
    fn name(&self) -> &str {
        "verbose"
    }

    fn description(&self) -> &str {
        "Show tool calls in replies (on/off, toggles without argument)"
    }

    async fn execute(&self, args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let enabled = match args.to_ascii_lowercase().as_str() {
            "" => !ctx.conversation.verbose,
            "on" => true,
            "off" => false,
            _ => return Err(WrenError::Usage("Usage: /verbose [on|off]".into())),
        };
        ctx.conversation = ctx
            .manager
            .set_verbose(&ctx.conversation.id, enabled)
            .await?;
        Ok(format!(
            "Verbose mode {}.",
            if enabled { "on" } else { "off" }
        ))
    }
}

pub struct StopCommand;

#[async_trait]
impl Command for StopCommand {
    fn name(&self) -> &str {
        "stop"
    }

    fn description(&self) -> &str {
        "Interrupt the turn running in this conversation"
    }

    async fn execute(&self, _args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        match ctx.runs.interrupt_conversation(&ctx.conversation.id) {
            0 => Ok("Nothing is running.".into()),
            _ => Ok("Stopped.".into()),
        }
    }
}

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Show the current conversation and token usage"
    }

    async fn execute(&self, _args: &str, ctx: &mut CommandContext) -> Result<String, WrenError> {
        let c = &ctx.conversation;
        let running = !ctx.runs.for_conversation(&c.id).is_empty();
        Ok(format!(
            "Conversation: {}\nTokens: {} in / {} out\nVerbose: {}\nRunning: {}",
            c.display_name(),
            c.input_tokens,
            c.output_tokens,
            if c.verbose { "on" } else { "off" },
            if running { "yes" } else { "no" },
        ))
    }
}
