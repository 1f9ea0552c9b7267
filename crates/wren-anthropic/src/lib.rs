// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic provider adapter for the Wren agent runtime.
//!
//! Implements [`ProviderAdapter`] over the non-streaming Messages API.
//! API key resolution order: config, then `ANTHROPIC_API_KEY`, else error.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::info;
use wren_config::model::AnthropicConfig;
use wren_core::{
    AdapterType, ContentBlock, HealthStatus, PluginAdapter, ProviderAdapter, ProviderMessage,
    ProviderRequest, ProviderResponse, Role, TokenUsage, ToolCall, WrenError,
};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContentBlock, ApiMessage, MessageRequest, MessageResponse, ResponseContentBlock,
    ToolDefinition,
};

/// Anthropic provider implementing [`ProviderAdapter`].
pub struct AnthropicProvider {
    client: AnthropicClient,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(config: &AnthropicConfig) -> Result<Self, WrenError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = AnthropicClient::new(&api_key, &config.api_version, &config.base_url)?;
        info!(model = %config.default_model, "Anthropic provider initialized");
        Ok(Self {
            client,
            default_model: config.default_model.clone(),
        })
    }

    fn to_message_request(&self, request: ProviderRequest) -> MessageRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };
        MessageRequest {
            model,
            messages: to_api_messages(request.messages),
            system: request.system_prompt,
            max_tokens: request.max_tokens,
            tools: request
                .tools
                .into_iter()
                .map(|t| ToolDefinition {
                    name: t.name,
                    description: t.description,
                    input_schema: t.parameters,
                })
                .collect(),
        }
    }
}

fn resolve_api_key(config_key: Option<&str>) -> Result<String, WrenError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }
    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        WrenError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

fn to_api_block(block: ContentBlock) -> ApiContentBlock {
    match block {
        ContentBlock::Text { text } => ApiContentBlock::Text { text },
        ContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse { id, name, input },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => ApiContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error: is_error.then_some(true),
        },
    }
}

/// Convert to API messages, merging consecutive messages with the same role
/// since the API expects alternating turns.
fn to_api_messages(messages: Vec<ProviderMessage>) -> Vec<ApiMessage> {
    let mut out: Vec<ApiMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        let role = match message.role {
            Role::Assistant => "assistant",
            _ => "user",
        };
        let blocks = message.content.into_iter().map(to_api_block);
        match out.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => out.push(ApiMessage {
                role: role.to_string(),
                content: blocks.collect(),
            }),
        }
    }
    out
}

fn from_message_response(response: MessageResponse) -> ProviderResponse {
    let mut text = Vec::new();
    let mut tool_call = None;
    for block in response.content {
        match block {
            ResponseContentBlock::Text { text: t } => text.push(t),
            // Only the first tool request of a response is honored.
            ResponseContentBlock::ToolUse { id, name, input } if tool_call.is_none() => {
                tool_call = Some(ToolCall { id, name, input });
            }
            _ => {}
        }
    }
    ProviderResponse {
        text: text.join("\n"),
        tool_call,
        usage: TokenUsage {
            input_tokens: u64::from(response.usage.input_tokens),
            output_tokens: u64::from(response.usage.output_tokens),
        },
        model: response.model,
        stop_reason: response.stop_reason,
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, WrenError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, WrenError> {
        let request = self.to_message_request(request);
        let response = self.client.complete_message(&request).await?;
        Ok(from_message_response(response))
    }
}
