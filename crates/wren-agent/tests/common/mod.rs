// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use std::sync::Arc;

use wren_agent::{
    Agent, AgentSettings, CommandRegistry, ConversationManager, EngineConfig, LoopEngine,
};
use wren_core::{InboundMessage, ProviderAdapter, StorageAdapter};
use wren_skill::{Tool, ToolRegistry};
use wren_test_utils::{MockReply, TestHarness};

pub struct Fixture {
    pub harness: TestHarness,
    pub engine: Arc<LoopEngine>,
    pub manager: Arc<ConversationManager>,
    pub agent: Arc<Agent>,
}

pub async fn fixture(replies: Vec<MockReply>, tools: Vec<Arc<dyn Tool>>) -> Fixture {
    fixture_with(TestHarness::with_replies(replies).await.unwrap(), tools)
}

pub fn fixture_with(harness: TestHarness, tools: Vec<Arc<dyn Tool>>) -> Fixture {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }

    let storage: Arc<dyn StorageAdapter> = harness.storage.clone();
    let provider: Arc<dyn ProviderAdapter> = harness.provider.clone();
    let engine = Arc::new(LoopEngine::new(
        Arc::clone(&provider),
        Arc::clone(&storage),
        Arc::new(registry),
        EngineConfig::from_config(&harness.config),
    ));
    let manager = Arc::new(ConversationManager::new(
        storage,
        provider,
        harness.config.compaction.clone(),
    ));
    let agent = Arc::new(Agent::new(
        Arc::clone(&engine),
        Arc::clone(&manager),
        CommandRegistry::with_builtins(),
        AgentSettings::from_config(&harness.config),
    ));

    Fixture {
        harness,
        engine,
        manager,
        agent,
    }
}

pub fn inbound(chat: &str, text: &str) -> InboundMessage {
    InboundMessage::new("test", chat, "user-1", text)
}
