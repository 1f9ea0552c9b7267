// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bounded model/tool reasoning loop.
//!
//! Each iteration sends the persisted conversation to the provider. A reply
//! without a tool request ends the turn; a tool request is executed (with
//! retries), its observation persisted, and the loop continues. Every step is
//! written to storage as it happens, so an interrupted turn keeps whatever it
//! already produced.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wren_config::model::WrenConfig;
use wren_core::{
    ContentBlock, Message, NewMessage, ProviderAdapter, ProviderMessage, ProviderRequest, Role,
    StorageAdapter, TokenUsage, ToolCall, WrenError,
};
use wren_skill::{ToolOutput, ToolRegistry};

/// Tunables for [`LoopEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Empty means the provider's default model.
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    /// Extra attempts after a failed tool execution.
    pub tool_retries: u32,
    /// Delay before retry `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
}

impl EngineConfig {
    pub fn from_config(config: &WrenConfig) -> Self {
        Self {
            model: String::new(),
            max_tokens: config.anthropic.max_tokens,
            system_prompt: config.agent.system_prompt.clone(),
            tool_retries: config.agent.tool_retries,
            retry_backoff: Duration::from_millis(config.agent.retry_backoff_ms),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_config(&WrenConfig::default())
    }
}

/// One tool execution as it happened during a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolTrace {
    pub tool: String,
    pub input: serde_json::Value,
    pub output: String,
    pub success: bool,
    pub attempts: u32,
}

/// Result of a turn that produced a final answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    pub answer: String,
    pub traces: Vec<ToolTrace>,
    pub usage: TokenUsage,
    /// Model calls made, including the final one.
    pub iterations: u32,
}

/// Drives a single conversational turn to completion.
pub struct LoopEngine {
    provider: Arc<dyn ProviderAdapter>,
    storage: Arc<dyn StorageAdapter>,
    tools: Arc<ToolRegistry>,
    config: EngineConfig,
}

impl LoopEngine {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        storage: Arc<dyn StorageAdapter>,
        tools: Arc<ToolRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            tools,
            config,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Appends `input` to the conversation and loops until the model answers
    /// without requesting a tool, or until `max_iterations` model calls have
    /// been made, in which case `MaxIterationsExceeded` is returned.
    ///
    /// `cancel` is honored between steps and while waiting on the model or a
    /// tool; storage writes are never cut in half.
    pub async fn run(
        &self,
        conversation_id: &str,
        input: &str,
        max_iterations: u32,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, WrenError> {
        self.storage
            .append_message(conversation_id, NewMessage::user(input))
            .await?;

        let mut outcome = TurnOutcome::default();

        for iteration in 1..=max_iterations {
            if cancel.is_cancelled() {
                return Err(WrenError::Cancelled);
            }
            let history = self.storage.list_messages(conversation_id).await?;
            let request = self.build_request(&history);
            debug!(
                conversation_id,
                iteration,
                messages = request.messages.len(),
                "calling provider"
            );

            let response = until_cancelled(cancel, self.provider.complete(request)).await?;
            outcome.iterations = iteration;
            outcome.usage += response.usage;
            self.storage
                .add_token_usage(
                    conversation_id,
                    response.usage.input_tokens,
                    response.usage.output_tokens,
                )
                .await?;

            let Some(call) = response.tool_call else {
                self.storage
                    .append_message(conversation_id, NewMessage::assistant(&response.text))
                    .await?;
                info!(
                    conversation_id,
                    iterations = iteration,
                    tools = outcome.traces.len(),
                    "turn completed"
                );
                outcome.answer = response.text;
                return Ok(outcome);
            };

            self.storage
                .append_message(
                    conversation_id,
                    NewMessage::tool_request(&response.text, call.clone()),
                )
                .await?;

            let (output, attempts) =
                until_cancelled(cancel, async { Ok(self.execute_with_retries(&call).await) })
                    .await?;
            self.storage
                .append_message(
                    conversation_id,
                    NewMessage::observation(&call.id, &output.content, !output.success),
                )
                .await?;

            outcome.traces.push(ToolTrace {
                tool: call.name,
                input: call.input,
                output: output.content,
                success: output.success,
                attempts,
            });
        }

        warn!(conversation_id, limit = max_iterations, "iteration limit reached");
        Err(WrenError::MaxIterationsExceeded {
            limit: max_iterations,
        })
    }

    /// Executes a tool call, retrying retryable failures with linear backoff.
    /// Failures that survive all attempts become an unsuccessful output.
    async fn execute_with_retries(&self, call: &ToolCall) -> (ToolOutput, u32) {
        let max_attempts = self.config.tool_retries + 1;
        let mut attempt = 1;
        loop {
            match self.tools.execute(&call.name, call.input.clone()).await {
                Ok(output) => {
                    debug!(tool = %call.name, attempt, success = output.success, "tool finished");
                    return (output, attempt);
                }
                Err(e) if attempt < max_attempts && e.is_retryable_tool_error() => {
                    warn!(tool = %call.name, attempt, error = %e, "tool failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(tool = %call.name, attempt, error = %e, "tool failed");
                    return (ToolOutput::failed(format!("Error: {e}")), attempt);
                }
            }
        }
    }

    fn build_request(&self, history: &[Message]) -> ProviderRequest {
        ProviderRequest {
            model: self.config.model.clone(),
            system_prompt: self.config.system_prompt.clone(),
            messages: to_provider_messages(history),
            tools: self.tools.schemas(),
            max_tokens: self.config.max_tokens,
        }
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, WrenError>>,
) -> Result<T, WrenError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WrenError::Cancelled),
        result = work => result,
    }
}

/// Text sent for a tool request whose observation was never stored.
pub(crate) const INTERRUPTED_TOOL_RESULT: &str = "Interrupted before completion.";

/// Converts stored messages to provider order.
///
/// Summaries become user-side context. Observations whose request is no
/// longer in the history (cut by compaction) are sent as plain text, since
/// providers reject results without a matching tool use. A request that
/// never got its observation (the turn was stopped mid-tool) is answered
/// with an error result so the next turn is still well formed.
pub(crate) fn to_provider_messages(history: &[Message]) -> Vec<ProviderMessage> {
    let mut pending: Vec<String> = Vec::new();
    let mut out: Vec<ProviderMessage> = Vec::with_capacity(history.len());

    for message in history {
        let (role, mut content) = match message.role {
            Role::System => (
                Role::User,
                vec![ContentBlock::Text {
                    text: format!("[Summary of earlier conversation]\n{}", message.content),
                }],
            ),
            Role::User => (
                Role::User,
                vec![ContentBlock::Text {
                    text: message.content.clone(),
                }],
            ),
            Role::Assistant => {
                let mut blocks = Vec::new();
                if !message.content.is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: message.content.clone(),
                    });
                }
                if let Some(call) = &message.tool_call {
                    blocks.push(ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.input.clone(),
                    });
                }
                if blocks.is_empty() {
                    continue;
                }
                (Role::Assistant, blocks)
            }
            Role::Tool => {
                let answered = message
                    .tool_call_id
                    .as_deref()
                    .and_then(|id| pending.iter().position(|p| p == id));
                let block = match answered {
                    Some(index) => ContentBlock::ToolResult {
                        tool_use_id: pending.remove(index),
                        content: message.content.clone(),
                        is_error: message.is_error,
                    },
                    None => ContentBlock::Text {
                        text: format!("[Tool result]\n{}", message.content),
                    },
                };
                (Role::User, vec![block])
            }
        };

        if message.role != Role::Tool && !pending.is_empty() {
            let closing = interrupted_results(&mut pending);
            if role == Role::User {
                content = closing.into_iter().chain(content).collect();
            } else {
                out.push(ProviderMessage {
                    role: Role::User,
                    content: closing,
                });
            }
        }
        if let Some(call) = &message.tool_call {
            pending.push(call.id.clone());
        }
        out.push(ProviderMessage { role, content });
    }

    if !pending.is_empty() {
        out.push(ProviderMessage {
            role: Role::User,
            content: interrupted_results(&mut pending),
        });
    }
    out
}

fn interrupted_results(pending: &mut Vec<String>) -> Vec<ContentBlock> {
    pending
        .drain(..)
        .map(|id| ContentBlock::ToolResult {
            tool_use_id: id,
            content: INTERRUPTED_TOOL_RESULT.to_string(),
            is_error: true,
        })
        .collect()
}
