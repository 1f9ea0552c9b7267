// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Wren runtime.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

/// Current UTC time as a lexicographically sortable RFC 3339 string.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

// --- Persisted entities ---

/// An external conversation partner, identified by channel and external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    /// Channel type, e.g. `telegram` or `cli`.
    pub channel: String,
    /// Identifier of the chat on the channel's side.
    pub external_id: String,
    pub current_conversation_id: Option<String>,
    pub created_at: String,
}

/// A persisted thread of messages belonging to one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub chat_id: String,
    pub label: Option<String>,
    pub archived: bool,
    pub is_current: bool,
    pub verbose: bool,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub created_at: String,
    /// Bumped on every appended message; drives recency ordering.
    pub updated_at: String,
}

impl Conversation {
    /// The label if set, otherwise the first eight characters of the id.
    pub fn display_name(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None => self.id.get(..8).unwrap_or(&self.id),
        }
    }
}

/// Author of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Compaction summaries and other injected context.
    System,
    User,
    Assistant,
    /// Observation produced by a tool execution.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// A stored message. Messages are append-only and ordered by `seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    /// Position within the conversation, strictly increasing.
    pub seq: i64,
    pub role: Role,
    pub content: String,
    /// Set on assistant messages that requested a tool.
    pub tool_call: Option<ToolCall>,
    /// Set on tool observations; references the originating call.
    pub tool_call_id: Option<String>,
    pub is_error: bool,
    pub created_at: String,
}

/// A message about to be appended; the store assigns id, seq and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub tool_call: Option<ToolCall>,
    pub tool_call_id: Option<String>,
    pub is_error: bool,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// An assistant turn that requested a tool call.
    pub fn tool_request(content: impl Into<String>, call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call: Some(call),
            tool_call_id: None,
            is_error: false,
        }
    }

    /// The observation produced for `call_id`.
    pub fn observation(call_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call: None,
            tool_call_id: Some(call_id.into()),
            is_error,
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
            is_error: false,
        }
    }
}

// --- Channel types ---

/// An inbound message received from a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Channel type the message arrived on.
    pub channel: String,
    /// Chat identity on that channel.
    pub chat_id: String,
    pub user_id: String,
    pub text: String,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

// --- Provider types ---

/// Tool description advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// A content block inside a provider message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A message in provider wire order. Only `user` and `assistant` roles appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

/// A request to an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Empty string means "use the provider's default model".
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub tools: Vec<ToolSchema>,
    pub max_tokens: u32,
}

/// Token usage reported for one provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// A response from an LLM provider: final text, or text plus one tool request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub tool_call: Option<ToolCall>,
    pub usage: TokenUsage,
    pub model: String,
    pub stop_reason: Option<String>,
}

// --- Run types ---

/// Lifecycle state of a background run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_label() {
        let mut conv = Conversation {
            id: "0123456789abcdef".into(),
            chat_id: "chat".into(),
            label: None,
            archived: false,
            is_current: true,
            verbose: false,
            input_tokens: 0,
            output_tokens: 0,
            created_at: now_timestamp(),
            updated_at: now_timestamp(),
        };
        assert_eq!(conv.display_name(), "01234567");
        conv.label = Some("work".into());
        assert_eq!(conv.display_name(), "work");
    }

    #[test]
    fn role_round_trips_through_strings() {
        use std::str::FromStr;
        for role in [Role::System, Role::User, Role::Assistant, Role::Tool] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let a = now_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = now_timestamp();
        assert!(a < b);
    }

    #[test]
    fn token_usage_accumulates() {
        let mut total = TokenUsage::default();
        total += TokenUsage {
            input_tokens: 10,
            output_tokens: 3,
        };
        total += TokenUsage {
            input_tokens: 5,
            output_tokens: 2,
        };
        assert_eq!(total.input_tokens, 15);
        assert_eq!(total.output_tokens, 5);
    }

    #[test]
    fn only_running_is_non_terminal() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Interrupted.is_terminal());
    }
}
