// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` forwards injected messages to its [`TurnHandler`] and keeps
//! the replies. Its [`ChannelBehavior`] lets tests simulate channels that
//! crash, exit early, or ignore stop requests; `stop` itself can be made
//! to fail or hang.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use wren_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, PluginAdapter, TurnHandler,
    WrenError,
};

/// How `start` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelBehavior {
    /// Serves messages until stopped.
    #[default]
    Normal,
    /// Panics right after starting.
    Panic,
    /// Returns immediately while still reporting itself as running.
    ExitEarly,
    /// Never returns, even after `stop`.
    IgnoreStop,
}

/// A mock messaging channel.
pub struct MockChannel {
    name: String,
    behavior: ChannelBehavior,
    handler: Arc<dyn TurnHandler>,
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<InboundMessage>>,
    replies: Arc<Mutex<Vec<String>>>,
    running: AtomicBool,
    shutdown: CancellationToken,
    fail_stop: bool,
    hang_stop: bool,
}

impl MockChannel {
    pub fn new(name: impl Into<String>, handler: Arc<dyn TurnHandler>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            behavior: ChannelBehavior::Normal,
            handler,
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            replies: Arc::new(Mutex::new(Vec::new())),
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            fail_stop: false,
            hang_stop: false,
        }
    }

    pub fn with_behavior(mut self, behavior: ChannelBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Makes `stop` return an error (after still signalling shutdown).
    pub fn with_failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Makes `stop` never return, without signalling shutdown.
    pub fn with_hanging_stop(mut self) -> Self {
        self.hang_stop = true;
        self
    }

    /// Queues a message as if a user had sent `text` from `chat_id`.
    pub fn inject(&self, chat_id: &str, text: &str) -> Result<(), WrenError> {
        self.inbound_tx
            .send(InboundMessage::new(&self.name, chat_id, "test-user", text))
            .map_err(|e| WrenError::Channel {
                message: format!("mock channel closed: {e}"),
                source: None,
            })
    }

    /// Replies produced so far, in order.
    pub async fn replies(&self) -> Vec<String> {
        self.replies.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WrenError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn start(&self) -> Result<(), WrenError> {
        self.running.store(true, Ordering::SeqCst);
        match self.behavior {
            ChannelBehavior::Normal => {}
            ChannelBehavior::Panic => panic!("mock channel '{}' crashed", self.name),
            ChannelBehavior::ExitEarly => return Ok(()),
            ChannelBehavior::IgnoreStop => {
                std::future::pending::<()>().await;
            }
        }

        let mut inbound = self.inbound_rx.lock().await;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                message = inbound.recv() => {
                    let Some(message) = message else { break };
                    let reply = match self.handler.handle_turn(message).await {
                        Ok(reply) => reply,
                        Err(e) => format!("Error: {e}"),
                    };
                    self.replies.lock().await.push(reply);
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), WrenError> {
        if self.hang_stop {
            std::future::pending::<()>().await;
        }
        self.shutdown.cancel();
        if self.fail_stop {
            return Err(WrenError::Channel {
                message: format!("mock channel '{}' failed to stop", self.name),
                source: None,
            });
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
