// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Providers, storage backends and channels extend the [`PluginAdapter`]
//! base trait and use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use channel::{ChannelAdapter, TurnHandler};
pub use provider::ProviderAdapter;
pub use storage::StorageAdapter;
