// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging transports (terminal, Telegram, etc.).

use async_trait::async_trait;

use crate::error::WrenError;
use crate::traits::adapter::PluginAdapter;
use crate::types::InboundMessage;

/// Receives turns from channels and produces the text to render.
///
/// The agent facade implements this; channels get a handle at construction
/// so they never depend on the agent crate directly.
#[async_trait]
pub trait TurnHandler: Send + Sync + 'static {
    /// Handles one inbound message (a directive or a conversational turn)
    /// and returns the reply text.
    async fn handle_turn(&self, inbound: InboundMessage) -> Result<String, WrenError>;
}

/// A long-running message transport.
///
/// `start` drives the channel until `stop` is called or the transport ends.
/// `is_running` reports whether the channel still intends to run, which the
/// supervisor uses to tell a crash from a normal exit.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Runs the receive loop. Returns once the channel has stopped.
    async fn start(&self) -> Result<(), WrenError>;

    /// Asks the receive loop to finish.
    async fn stop(&self) -> Result<(), WrenError>;

    /// Whether the channel considers itself running.
    fn is_running(&self) -> bool;
}
