// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel for Wren.
//!
//! Long-polls the Bot API through teloxide, forwards private text messages
//! from allowed users to the [`TurnHandler`], and sends the reply back in
//! as many messages as Telegram's length limit requires.

pub mod handler;
pub mod split;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wren_config::model::TelegramConfig;
use wren_core::{
    AdapterType, ChannelAdapter, HealthStatus, PluginAdapter, TurnHandler, WrenError,
};

use crate::split::{MAX_MESSAGE_LEN, split_message};

/// Telegram transport implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    allowed_users: Arc<Vec<String>>,
    handler: Arc<dyn TurnHandler>,
    running: AtomicBool,
    stop_requested: CancellationToken,
    dispatcher_token: std::sync::Mutex<Option<ShutdownToken>>,
}

impl TelegramChannel {
    /// Fails with a configuration error when no bot token is set.
    pub fn new(config: &TelegramConfig, handler: Arc<dyn TurnHandler>) -> Result<Self, WrenError> {
        let token = config
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WrenError::Config("telegram.bot_token is not set".into()))?;

        if config.allowed_users.is_empty() {
            warn!("telegram.allowed_users is empty; every message will be ignored");
        }

        Ok(Self {
            bot: Bot::new(token),
            allowed_users: Arc::new(config.allowed_users.clone()),
            handler,
            running: AtomicBool::new(false),
            stop_requested: CancellationToken::new(),
            dispatcher_token: std::sync::Mutex::new(None),
        })
    }

    fn set_dispatcher_token(&self, token: Option<ShutdownToken>) {
        *self
            .dispatcher_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        handler::CHANNEL_NAME
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WrenError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn start(&self) -> Result<(), WrenError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(WrenError::AlreadyRunning);
        }

        let allowed = Arc::clone(&self.allowed_users);
        let turn_handler = Arc::clone(&self.handler);
        let schema = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let allowed = Arc::clone(&allowed);
            let turn_handler = Arc::clone(&turn_handler);
            async move {
                if !handler::is_dm(&msg) {
                    debug!(chat_id = msg.chat.id.0, "ignoring non-private chat");
                    return respond(());
                }
                if !handler::is_authorized(&msg, &allowed) {
                    debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                    return respond(());
                }
                let Some(inbound) = handler::to_inbound(&msg) else {
                    debug!(msg_id = msg.id.0, "ignoring non-text message");
                    return respond(());
                };

                // Turns run outside the dispatcher so a later `/stop` from the
                // same chat is not queued behind them.
                let chat_id = msg.chat.id;
                tokio::spawn(async move {
                    if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
                        debug!(error = %e, "typing indicator failed");
                    }
                    let reply = match turn_handler.handle_turn(inbound).await {
                        Ok(reply) => reply,
                        Err(e) => format!("Error: {e}"),
                    };
                    send_reply(&bot, chat_id, &reply).await;
                });
                respond(())
            }
        });

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), schema)
            .default_handler(|_| async {})
            .build();
        self.set_dispatcher_token(Some(dispatcher.shutdown_token()));

        info!("telegram long polling started");
        tokio::select! {
            biased;
            _ = self.stop_requested.cancelled() => {}
            _ = dispatcher.dispatch() => {}
        }

        self.set_dispatcher_token(None);
        self.running.store(false, Ordering::SeqCst);
        info!("telegram long polling stopped");
        Ok(())
    }

    async fn stop(&self) -> Result<(), WrenError> {
        let token = self
            .dispatcher_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(token) = token
            && let Ok(shutdown) = token.shutdown()
        {
            shutdown.await;
        }
        self.stop_requested.cancel();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &str) {
    let chunks = split_message(reply, MAX_MESSAGE_LEN);
    if chunks.is_empty() {
        return;
    }
    for chunk in chunks {
        if let Err(e) = bot.send_message(chat_id, chunk).await {
            warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
            return;
        }
    }
}
