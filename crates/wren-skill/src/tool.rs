// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! Tools report ordinary unsuccessful outcomes (a command exiting non-zero)
//! as a [`ToolOutput`] with `success == false`, and infrastructure failures
//! as [`WrenError::ToolExecution`] with a [`ToolErrorKind`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wren_core::{ToolSchema, WrenError};

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text handed back to the model as the observation.
    pub content: String,
    pub success: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
        }
    }

    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
        }
    }
}

/// A capability the model can call by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in provider requests.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Runs the tool with the model-supplied arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, WrenError>;

    /// The advertisement sent to the provider.
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Tools indexed by name. Built once at startup, then shared read-only.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its `name()`.
    ///
    /// Registration is idempotent by name: if a tool with the same name is
    /// already present it is kept and `false` is returned.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            debug!(tool = %name, "tool already registered, keeping existing");
            return false;
        }
        self.tools.insert(name, tool);
        true
    }

    /// Registers the tool produced by `build` unless `name` is already taken,
    /// in which case `build` is never called.
    pub fn register_with<F>(&mut self, name: &str, build: F) -> Result<bool, WrenError>
    where
        F: FnOnce() -> Result<Arc<dyn Tool>, WrenError>,
    {
        if self.tools.contains_key(name) {
            return Ok(false);
        }
        let tool = build()?;
        if tool.name() != name {
            return Err(WrenError::Internal(format!(
                "tool registered as '{name}' reports name '{}'",
                tool.name()
            )));
        }
        Ok(self.register(tool))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Schemas of all tools, sorted by name for stable requests.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Runs the named tool. Fails with `UnknownTool` if it is not registered.
    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, WrenError> {
        let tool = self
            .get(name)
            .ok_or_else(|| WrenError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
