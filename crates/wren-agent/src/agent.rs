// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry point for inbound messages.
//!
//! Directives go to the [`CommandRegistry`]; anything else starts a [`Run`]
//! against the chat's current conversation. Turns for the same conversation
//! are queued behind each other so their messages never interleave.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info};
use wren_config::model::WrenConfig;
use wren_core::{InboundMessage, TurnHandler, WrenError};

use crate::commands::{CommandContext, CommandRegistry};
use crate::conversation::ConversationManager;
use crate::engine::{LoopEngine, ToolTrace, TurnOutcome};
use crate::run::{ActiveRuns, Run, RunCallbacks};

/// Trace output longer than this is cut in verbose replies.
const TRACE_PREVIEW_CHARS: usize = 300;

/// What `submit` did with a message.
pub enum Submission {
    /// A directive ran; this is its reply.
    Reply(String),
    /// A conversational turn was started in the background.
    Run(Arc<Run>),
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_iterations: u32,
    pub serialize_conversations: bool,
}

impl AgentSettings {
    pub fn from_config(config: &WrenConfig) -> Self {
        Self {
            max_iterations: config.agent.max_iterations,
            serialize_conversations: config.agent.serialize_conversations,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&WrenConfig::default())
    }
}

pub struct Agent {
    engine: Arc<LoopEngine>,
    conversations: Arc<ConversationManager>,
    commands: CommandRegistry,
    runs: ActiveRuns,
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        engine: Arc<LoopEngine>,
        conversations: Arc<ConversationManager>,
        commands: CommandRegistry,
        settings: AgentSettings,
    ) -> Self {
        Self {
            engine,
            conversations,
            commands,
            runs: ActiveRuns::new(),
            turn_locks: DashMap::new(),
            settings,
        }
    }

    pub fn runs(&self) -> &ActiveRuns {
        &self.runs
    }

    pub fn conversations(&self) -> &Arc<ConversationManager> {
        &self.conversations
    }

    /// Routes a message and returns without waiting for a turn to finish.
    pub async fn submit(
        &self,
        inbound: &InboundMessage,
        callbacks: RunCallbacks,
    ) -> Result<Submission, WrenError> {
        let chat = self
            .conversations
            .chat_for(&inbound.channel, &inbound.chat_id)
            .await?;
        let conversation = self.conversations.current_for(&chat).await?;

        if self.commands.is_command(&inbound.text) {
            let mut ctx = CommandContext {
                chat,
                conversation,
                user_id: inbound.user_id.clone(),
                manager: Arc::clone(&self.conversations),
                runs: self.runs.clone(),
                available: Vec::new(),
            };
            let reply = self.commands.execute(&inbound.text, &mut ctx).await;
            debug!(chat_id = %ctx.chat.id, conversation_id = %ctx.conversation.id, "command handled");
            return Ok(Submission::Reply(reply));
        }

        let run = Run::tracked(&conversation.id, &self.runs);
        let engine = Arc::clone(&self.engine);
        let lock = self
            .settings
            .serialize_conversations
            .then(|| self.turn_lock(&conversation.id));
        let conversation_id = conversation.id.clone();
        let text = inbound.text.clone();
        let max_iterations = self.settings.max_iterations;
        let cancel = run.cancellation_token();

        run.start(
            async move {
                let _guard = match &lock {
                    Some(lock) => tokio::select! {
                        guard = lock.lock() => Some(guard),
                        _ = cancel.cancelled() => return Err(WrenError::Cancelled),
                    },
                    None => None,
                };
                engine
                    .run(&conversation_id, &text, max_iterations, &cancel)
                    .await
            },
            callbacks,
        )?;
        info!(run_id = %run.id(), conversation_id = %conversation.id, "turn submitted");
        Ok(Submission::Run(run))
    }

    /// Routes a message and waits for the reply text.
    pub async fn respond(&self, inbound: &InboundMessage) -> Result<String, WrenError> {
        let (tx, rx) = oneshot::channel::<Result<TurnOutcome, String>>();
        let error_tx = Arc::new(std::sync::Mutex::new(Some(tx)));
        let success_tx = Arc::clone(&error_tx);

        let callbacks = RunCallbacks::new()
            .on_success(move |outcome| send_once(&success_tx, Ok(outcome.clone())))
            .on_error(move |e| send_once(&error_tx, Err(render_error(e))));

        let run = match self.submit(inbound, callbacks).await? {
            Submission::Reply(reply) => return Ok(reply),
            Submission::Run(run) => run,
        };
        run.wait().await;

        let verbose = self
            .conversations
            .get(run.conversation_id())
            .await
            .is_ok_and(|c| c.verbose);
        Ok(match rx.await {
            Ok(Ok(outcome)) => render_outcome(&outcome, verbose),
            Ok(Err(message)) => message,
            // Neither callback fires for an interrupted run.
            Err(_) => "Stopped.".to_string(),
        })
    }

    fn turn_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.turn_locks
                .entry(conversation_id.to_string())
                .or_default()
                .value(),
        )
    }
}

#[async_trait]
impl TurnHandler for Agent {
    async fn handle_turn(&self, inbound: InboundMessage) -> Result<String, WrenError> {
        self.respond(&inbound).await
    }
}

type ReplySender = oneshot::Sender<Result<TurnOutcome, String>>;

fn send_once(slot: &std::sync::Mutex<Option<ReplySender>>, value: Result<TurnOutcome, String>) {
    let sender = slot
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    if let Some(sender) = sender {
        let _ = sender.send(value);
    }
}

fn render_error(e: &WrenError) -> String {
    match e {
        WrenError::MaxIterationsExceeded { limit } => format!(
            "I stopped after {limit} reasoning steps without reaching an answer. Try a narrower request, or ask me to continue."
        ),
        e if e.is_user_facing() => e.to_string(),
        e => format!("Error: {e}"),
    }
}

/// The answer, preceded by a tool trace when verbose mode is on.
pub fn render_outcome(outcome: &TurnOutcome, verbose: bool) -> String {
    if !verbose || outcome.traces.is_empty() {
        return outcome.answer.clone();
    }
    let mut out: Vec<String> = outcome.traces.iter().map(render_trace).collect();
    out.push(String::new());
    out.push(outcome.answer.clone());
    out.join("\n")
}

fn render_trace(trace: &ToolTrace) -> String {
    let status = if trace.success { "ok" } else { "failed" };
    let mut preview: String = trace.output.chars().take(TRACE_PREVIEW_CHARS).collect();
    if preview.len() < trace.output.len() {
        preview.push_str("...");
    }
    let retries = match trace.attempts {
        0 | 1 => String::new(),
        n => format!(", {n} attempts"),
    };
    format!(
        "[{} {} -> {status}{retries}]\n{}",
        trace.tool,
        trace.input,
        preview.trim_end()
    )
}
