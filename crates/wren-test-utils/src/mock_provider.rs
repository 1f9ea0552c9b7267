// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` pops scripted replies from a FIFO queue. When the queue is
//! empty the fallback reply is used, which by default is the text
//! "mock response". Every request is recorded for later assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use wren_core::{
    AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderRequest, ProviderResponse,
    TokenUsage, ToolCall, WrenError,
};

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A final answer.
    Text(String),
    /// A request to run a tool.
    ToolCall {
        name: String,
        input: serde_json::Value,
    },
    /// A provider failure.
    Error(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tool_call(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolCall {
            name: name.into(),
            input,
        }
    }
}

/// A mock LLM provider that returns pre-configured replies.
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A provider that always answers "mock response".
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockReply::text("mock response"),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// A provider that plays `replies` in order, then falls back.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(replies)),
            ..Self::new()
        }
    }

    /// A provider that answers each call with the next text.
    pub fn with_responses(responses: Vec<&str>) -> Self {
        Self::with_replies(responses.into_iter().map(MockReply::text).collect())
    }

    /// Reply used once the script is exhausted.
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Makes every call take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn push_reply(&self, reply: MockReply) {
        self.script.lock().await.push_back(reply);
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, WrenError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().await.push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        };
        match reply {
            MockReply::Text(text) => Ok(ProviderResponse {
                text,
                tool_call: None,
                usage,
                model: "mock-model".into(),
                stop_reason: Some("end_turn".into()),
            }),
            MockReply::ToolCall { name, input } => Ok(ProviderResponse {
                text: String::new(),
                tool_call: Some(ToolCall {
                    id: format!("call_{n}"),
                    name,
                    input,
                }),
                usage,
                model: "mock-model".into(),
                stop_reason: Some("tool_use".into()),
            }),
            MockReply::Error(message) => Err(WrenError::Provider {
                message,
                source: None,
            }),
        }
    }
}
