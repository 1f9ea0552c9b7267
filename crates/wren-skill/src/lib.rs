// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools the agent can invoke while reasoning.
//!
//! The [`Tool`] trait is the closed interface every capability implements;
//! [`ToolRegistry`] is built once at startup and resolves tools by name.

pub mod builtin;
pub mod tool;

pub use builtin::register_builtins;
pub use tool::{Tool, ToolOutput, ToolRegistry};
