// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Wren integration tests.
//!
//! - [`MockProvider`] - scripted LLM provider
//! - [`MockChannel`] - channel with injectable messages and failure modes
//! - [`StaticTool`], [`FlakyTool`], [`SlowTool`] - tools with fixed, failing or slow behavior
//! - [`TestHarness`] - temp SQLite storage plus a mock provider

pub mod harness;
pub mod mock_channel;
pub mod mock_provider;
pub mod mock_tools;

pub use harness::TestHarness;
pub use mock_channel::{ChannelBehavior, MockChannel};
pub use mock_provider::{MockProvider, MockReply};
pub use mock_tools::{FlakyTool, SlowTool, StaticTool};
