// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools.

pub mod shell;
pub mod web_search;

pub use shell::ShellTool;
pub use web_search::WebSearchTool;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use wren_config::model::ToolsConfig;

use crate::ToolRegistry;

/// Registers the built-in tools enabled by `config`.
///
/// The shell tool is always present; web search needs an endpoint.
pub fn register_builtins(registry: &mut ToolRegistry, config: &ToolsConfig) {
    registry.register(Arc::new(ShellTool::new(Duration::from_secs(
        config.shell_timeout_secs,
    ))));

    match &config.search_endpoint {
        Some(endpoint) => {
            registry.register(Arc::new(WebSearchTool::new(
                endpoint.clone(),
                config.search_api_key.clone(),
            )));
        }
        None => debug!("no search endpoint configured, web_search disabled"),
    }
}
