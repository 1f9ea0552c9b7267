// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools with scripted behavior.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wren_core::{ToolErrorKind, WrenError};
use wren_skill::{Tool, ToolOutput};

/// Returns the same output on every call and counts invocations.
pub struct StaticTool {
    name: String,
    output: ToolOutput,
    calls: AtomicU32,
}

impl StaticTool {
    pub fn new(name: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            name: name.into(),
            output,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns a fixed output"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, WrenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Fails with the given kind for the first `failures` calls, then succeeds.
pub struct FlakyTool {
    name: String,
    kind: ToolErrorKind,
    failures: u32,
    calls: AtomicU32,
}

impl FlakyTool {
    pub fn new(name: impl Into<String>, kind: ToolErrorKind, failures: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            failures,
            calls: AtomicU32::new(0),
        }
    }

    /// Never succeeds.
    pub fn always_failing(name: impl Into<String>, kind: ToolErrorKind) -> Self {
        Self::new(name, kind, u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FlakyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Fails a configured number of times"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, WrenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(WrenError::tool(
                &self.name,
                self.kind,
                format!("scripted failure {call}"),
            ));
        }
        Ok(ToolOutput::ok(format!("succeeded on call {call}")))
    }
}

/// Sleeps before answering, long enough to be interrupted mid-call.
pub struct SlowTool {
    name: String,
    delay: Duration,
    calls: AtomicU32,
}

impl SlowTool {
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            calls: AtomicU32::new(0),
        }
    }

    /// Calls started so far, including ones still sleeping.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Answers after a delay"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, WrenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(ToolOutput::ok("finally done"))
    }
}
