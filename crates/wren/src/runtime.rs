// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every subcommand: storage, provider, tools, agent, and
//! the channel supervisor.

use std::sync::Arc;

use tracing::info;
use wren_agent::{
    Agent, AgentSettings, ChannelFactory, ChannelSupervisor, CommandRegistry,
    ConversationManager, EngineConfig, FactoryResult, LoopEngine,
};
use wren_anthropic::AnthropicProvider;
use wren_config::model::WrenConfig;
use wren_core::{InboundMessage, ProviderAdapter, StorageAdapter, TurnHandler, WrenError};
use wren_skill::ToolRegistry;
use wren_storage::SqliteStorage;

use crate::terminal::TerminalChannel;

/// Channel and chat used for one-shot `send` invocations.
pub const CLI_CHANNEL: &str = "cli";

/// A fully assembled agent.
pub struct Runtime {
    pub config: Arc<WrenConfig>,
    pub storage: Arc<SqliteStorage>,
    pub agent: Arc<Agent>,
}

impl Runtime {
    /// Assembles the runtime with the Anthropic provider.
    pub async fn from_config(config: WrenConfig) -> Result<Self, WrenError> {
        let provider = Arc::new(AnthropicProvider::new(&config.anthropic)?);
        Self::with_provider(config, provider).await
    }

    /// Assembles the runtime around an arbitrary provider.
    pub async fn with_provider(
        config: WrenConfig,
        provider: Arc<dyn ProviderAdapter>,
    ) -> Result<Self, WrenError> {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        let store: Arc<dyn StorageAdapter> = storage.clone();

        let mut tools = ToolRegistry::new();
        wren_skill::register_builtins(&mut tools, &config.tools);
        info!(tools = tools.len(), "tool registry initialized");

        let engine = Arc::new(LoopEngine::new(
            Arc::clone(&provider),
            Arc::clone(&store),
            Arc::new(tools),
            EngineConfig::from_config(&config),
        ));
        let conversations = Arc::new(ConversationManager::new(
            store,
            provider,
            config.compaction.clone(),
        ));
        let agent = Arc::new(Agent::new(
            engine,
            conversations,
            CommandRegistry::with_builtins(),
            AgentSettings::from_config(&config),
        ));

        Ok(Self {
            config: Arc::new(config),
            storage,
            agent,
        })
    }

    /// A supervisor with no channels registered.
    pub fn supervisor(&self) -> ChannelSupervisor {
        let handler: Arc<dyn TurnHandler> = self.agent.clone();
        ChannelSupervisor::new(Arc::clone(&self.config), handler)
    }

    /// Handles one message from the command line and returns the reply.
    pub async fn send(&self, chat_id: &str, text: &str) -> Result<String, WrenError> {
        self.agent
            .respond(&InboundMessage::new(CLI_CHANNEL, chat_id, "local", text))
            .await
    }

    /// Flushes storage; call before exiting.
    pub async fn close(&self) -> Result<(), WrenError> {
        self.storage.close().await
    }
}

/// Builds the interactive terminal channel.
pub fn terminal_factory() -> ChannelFactory {
    Box::new(|config: &WrenConfig, handler: Arc<dyn TurnHandler>| -> FactoryResult {
        Ok(Arc::new(TerminalChannel::new(&config.agent.name, handler)))
    })
}

/// Builds the Telegram channel; fails when no bot token is configured.
#[cfg(feature = "telegram")]
pub fn telegram_factory() -> ChannelFactory {
    Box::new(|config: &WrenConfig, handler: Arc<dyn TurnHandler>| -> FactoryResult {
        Ok(Arc::new(wren_telegram::TelegramChannel::new(
            &config.telegram,
            handler,
        )?))
    })
}
