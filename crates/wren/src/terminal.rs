// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive terminal channel.
//!
//! A reader thread owns the line editor and hands each line to the async
//! side, which starts the turn in its own task and acknowledges at once. The
//! prompt therefore stays available while a turn runs, so `/stop` and
//! `/status` reach the agent mid-turn. The thread is a plain OS thread rather than a blocking task: a pending
//! `readline` cannot be interrupted, and the runtime must not wait for it on
//! shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wren_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundMessage, PluginAdapter, TurnHandler,
    WrenError,
};

/// Channel name; also the chat identity of the local user.
pub const TERMINAL_CHANNEL: &str = "terminal";

/// What the reader thread reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Line(String),
    Quit,
}

pub struct TerminalChannel {
    prompt_name: String,
    handler: Arc<dyn TurnHandler>,
    running: AtomicBool,
    shutdown: CancellationToken,
}

impl TerminalChannel {
    pub fn new(prompt_name: &str, handler: Arc<dyn TurnHandler>) -> Self {
        Self {
            prompt_name: prompt_name.to_string(),
            handler,
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Answers lines from `events` until the user quits or `stop` is called.
    /// Every line is acknowledged on `acks` once its turn has been started.
    ///
    /// After a quit, replies still pending are printed before returning;
    /// `stop` abandons them.
    pub async fn serve(
        &self,
        mut events: mpsc::UnboundedReceiver<TerminalEvent>,
        acks: std::sync::mpsc::Sender<()>,
    ) -> Result<(), WrenError> {
        let mut turns = JoinSet::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(joined) = turns.join_next(), if !turns.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "terminal turn failed");
                    }
                    continue;
                }
                event = events.recv() => event,
            };
            let Some(TerminalEvent::Line(text)) = event else {
                debug!("terminal input closed");
                break;
            };

            let handler = Arc::clone(&self.handler);
            let inbound = InboundMessage::new(TERMINAL_CHANNEL, "local", "local", text);
            turns.spawn(async move {
                match handler.handle_turn(inbound).await {
                    Ok(reply) => println!("{reply}\n"),
                    Err(e) => eprintln!("{}: {e}\n", "error".red()),
                }
            });
            if acks.send(()).is_err() {
                break;
            }
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = async { while turns.join_next().await.is_some() {} } => {}
        }
        turns.shutdown().await;
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for TerminalChannel {
    fn name(&self) -> &str {
        TERMINAL_CHANNEL
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
impl ChannelAdapter for TerminalChannel {
    async fn start(&self) -> Result<(), WrenError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(WrenError::AlreadyRunning);
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        let prompt = format!("{}> ", self.prompt_name.green());
        let spawned = std::thread::Builder::new()
            .name("wren-terminal".into())
            .spawn(move || read_lines(&prompt, &event_tx, &ack_rx));
        if let Err(e) = spawned {
            self.running.store(false, Ordering::SeqCst);
            return Err(WrenError::Internal(format!(
                "failed to spawn terminal reader: {e}"
            )));
        }

        println!("{}", self.prompt_name.bold().green());
        println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

        let result = self.serve(event_rx, ack_tx).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn stop(&self) -> Result<(), WrenError> {
        self.shutdown.cancel();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn read_lines(
    prompt: &str,
    events: &mpsc::UnboundedSender<TerminalEvent>,
    acks: &std::sync::mpsc::Receiver<()>,
) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            warn!(error = %e, "failed to initialize line editor");
            let _ = events.send(TerminalEvent::Quit);
            return;
        }
    };

    loop {
        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if matches!(trimmed, "/quit" | "/exit") {
                    let _ = events.send(TerminalEvent::Quit);
                    return;
                }
                let _ = editor.add_history_entry(trimmed);
                if events.send(TerminalEvent::Line(trimmed.to_string())).is_err() {
                    return;
                }
                // Wait until the turn has been started before prompting again.
                if acks.recv().is_err() {
                    return;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                let _ = events.send(TerminalEvent::Quit);
                return;
            }
            Err(e) => {
                warn!(error = %e, "terminal read failed");
                let _ = events.send(TerminalEvent::Quit);
                return;
            }
        }
    }
}
