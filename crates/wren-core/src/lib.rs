// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wren agent runtime.
//!
//! This crate provides the error taxonomy, the persisted domain types
//! (chats, conversations, messages) and the adapter traits implemented by
//! providers, storage backends and message channels.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ToolErrorKind, WrenError};
pub use types::{
    AdapterType, Chat, ContentBlock, Conversation, HealthStatus, InboundMessage, Message,
    NewMessage, ProviderMessage, ProviderRequest, ProviderResponse, Role, RunStatus, TokenUsage,
    ToolCall, ToolSchema,
};

pub use traits::{ChannelAdapter, PluginAdapter, ProviderAdapter, StorageAdapter, TurnHandler};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Channel, AdapterType::Provider, AdapterType::Storage] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_turn_handler<T: TurnHandler>() {}
    }
}
