// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wren agent runtime.

use thiserror::Error;

/// Classification of a failure raised by a tool implementation.
///
/// Tools report their domain failures through this kind so the loop engine
/// can render a consistent observation for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ToolErrorKind {
    NotFound,
    PermissionDenied,
    ConnectionRefused,
    MalformedResponse,
    Timeout,
    Other,
}

/// The primary error type used across all Wren crates.
#[derive(Debug, Error)]
pub enum WrenError {
    /// Configuration errors, including channels that cannot be constructed
    /// because required settings are missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors (API failure, token limits, model not found).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A malformed directive; the message is shown to the user as-is.
    #[error("{0}")]
    Usage(String),

    /// An identifier did not resolve to any record.
    #[error("{kind} not found: {identifier}")]
    NotFound { kind: String, identifier: String },

    /// The requested state transition is not allowed.
    #[error("{0}")]
    InvalidOperation(String),

    /// Another conversation in the same chat already carries this label.
    #[error("label '{label}' is already used by another conversation")]
    LabelTaken { label: String },

    /// A value failed format validation.
    #[error("{0}")]
    InvalidFormat(String),

    /// The model asked for a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A registered tool failed while executing.
    #[error("tool '{tool}' failed ({kind}): {message}")]
    ToolExecution {
        tool: String,
        kind: ToolErrorKind,
        message: String,
    },

    /// The reasoning loop used its whole iteration budget without a final answer.
    #[error("reached the maximum of {limit} iterations without a final answer")]
    MaxIterationsExceeded { limit: u32 },

    /// The channel supervisor was asked to start while already running.
    #[error("channels are already running")]
    AlreadyRunning,

    /// A channel task died unexpectedly.
    #[error("channel '{channel}' crashed: {message}")]
    ThreadCrash { channel: String, message: String },

    /// A run was interrupted before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WrenError {
    /// Shorthand for a [`WrenError::NotFound`].
    pub fn not_found(kind: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            identifier: identifier.into(),
        }
    }

    /// Shorthand for a [`WrenError::ToolExecution`].
    pub fn tool(tool: impl Into<String>, kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            kind,
            message: message.into(),
        }
    }

    /// Whether this error is a user-correctable condition whose message can
    /// be shown verbatim in a reply.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Usage(_)
                | Self::NotFound { .. }
                | Self::InvalidOperation(_)
                | Self::LabelTaken { .. }
                | Self::InvalidFormat(_)
        )
    }

    /// Whether a tool failure is worth retrying. Unknown tools never are.
    pub fn is_retryable_tool_error(&self) -> bool {
        match self {
            Self::ToolExecution { kind, .. } => !matches!(
                kind,
                ToolErrorKind::NotFound | ToolErrorKind::PermissionDenied
            ),
            Self::UnknownTool(_) => false,
            _ => true,
        }
    }
}
