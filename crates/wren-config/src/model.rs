// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so misspelled keys are
//! rejected at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Wren configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WrenConfig {
    /// Reasoning loop behavior.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Channel supervisor settings.
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Built-in tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Conversation compaction settings.
    #[serde(default)]
    pub compaction: CompactionConfig,
}

/// Agent identity and loop behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Model calls allowed per turn before giving up.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Extra attempts after a failed tool execution.
    #[serde(default = "default_tool_retries")]
    pub tool_retries: u32,

    /// Base delay between tool retries; grows linearly with the attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Queue concurrent turns against the same conversation.
    #[serde(default = "default_true")]
    pub serialize_conversations: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            max_iterations: default_max_iterations(),
            tool_retries: default_tool_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            serialize_conversations: true,
        }
    }
}

fn default_agent_name() -> String {
    "wren".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_iterations() -> u32 {
    10
}

fn default_tool_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. Falls back to `ANTHROPIC_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used when a request does not name one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Value of the `anthropic-version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Base URL, overridable for proxies and tests.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            base_url: default_base_url(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wren").join("wren.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("wren.db"))
        .to_string_lossy()
        .into_owned()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. `None` leaves the Telegram channel unconfigured.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user IDs or usernames allowed to talk to the bot.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Channel supervisor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelsConfig {
    /// Channel names that must not be started.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// How long `stop_all` waits for a channel task before aborting it.
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,

    /// Interval between monitor sweeps for dead channel tasks.
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            join_timeout_secs: default_join_timeout_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
        }
    }
}

fn default_join_timeout_secs() -> u64 {
    5
}

fn default_monitor_interval_secs() -> u64 {
    2
}

/// Built-in tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Wall-clock limit for one shell command.
    #[serde(default = "default_shell_timeout_secs")]
    pub shell_timeout_secs: u64,

    /// Search API endpoint. `None` disables the web search tool.
    #[serde(default)]
    pub search_endpoint: Option<String>,

    /// Bearer token for the search endpoint.
    #[serde(default)]
    pub search_api_key: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell_timeout_secs: default_shell_timeout_secs(),
            search_endpoint: None,
            search_api_key: None,
        }
    }
}

fn default_shell_timeout_secs() -> u64 {
    30
}

/// Conversation compaction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompactionConfig {
    /// Conversations shorter than this cannot be compacted.
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,

    /// Messages kept verbatim when `/compact` is given no argument.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            min_messages: default_min_messages(),
            keep_recent: default_keep_recent(),
        }
    }
}

fn default_min_messages() -> usize {
    4
}

fn default_keep_recent() -> usize {
    5
}
