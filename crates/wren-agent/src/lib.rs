// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent runtime for Wren.
//!
//! - [`LoopEngine`] runs one bounded model/tool reasoning turn
//! - [`Run`] executes a turn in the background with interrupt support
//! - [`ConversationManager`] keeps each chat's conversations in order
//! - [`CommandRegistry`] handles `/command` directives
//! - [`Agent`] routes inbound messages to commands or runs
//! - [`ChannelSupervisor`] runs and watches the message channels

pub mod agent;
pub mod commands;
pub mod compaction;
pub mod conversation;
pub mod engine;
pub mod run;
pub mod shutdown;
pub mod supervisor;

pub use agent::{Agent, AgentSettings, Submission};
pub use commands::{Command, CommandContext, CommandRegistry};
pub use conversation::{ArchiveOutcome, CompactionOutcome, ConversationManager, ListFilter};
pub use engine::{EngineConfig, LoopEngine, ToolTrace, TurnOutcome};
pub use run::{ActiveRuns, Run, RunCallbacks};
pub use supervisor::{ChannelFactory, ChannelSupervisor, FactoryResult, SupervisorState};
