// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in shell command tool.
//!
//! Runs commands through `bash -c`. A non-zero exit is a normal, unsuccessful
//! output rather than an error; only spawn failures and timeouts are errors.

use std::time::Duration;

use async_trait::async_trait;
use wren_core::{ToolErrorKind, WrenError};

use crate::tool::{Tool, ToolOutput};

/// Output beyond this many bytes is cut before reaching the model.
const MAX_OUTPUT_SIZE: usize = 32 * 1024;

/// Executes shell commands and returns stdout/stderr.
pub struct ShellTool {
    timeout: Duration,
}

impl ShellTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_OUTPUT_SIZE {
        return text.to_string();
    }
    let mut end = MAX_OUTPUT_SIZE;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n[output truncated from {} bytes]", &text[..end], text.len())
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its stdout/stderr and exit code"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to run with bash -c"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, WrenError> {
        let command = arguments["command"].as_str().ok_or_else(|| {
            WrenError::tool("shell", ToolErrorKind::Other, "missing required 'command' parameter")
        })?;

        let child = tokio::process::Command::new("bash")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output();

        // Dropping the output future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                WrenError::tool(
                    "shell",
                    ToolErrorKind::Timeout,
                    format!("command timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| {
                let kind = match e.kind() {
                    std::io::ErrorKind::NotFound => ToolErrorKind::NotFound,
                    std::io::ErrorKind::PermissionDenied => ToolErrorKind::PermissionDenied,
                    _ => ToolErrorKind::Other,
                };
                WrenError::tool("shell", kind, format!("failed to spawn bash: {e}"))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            return Ok(ToolOutput::failed(truncate(&format!(
                "Exit code: {exit_code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
            ))));
        }

        let content = if stderr.is_empty() {
            stdout.to_string()
        } else {
            format!("{stdout}\nstderr:\n{stderr}")
        };
        Ok(ToolOutput::ok(truncate(&content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> ShellTool {
        ShellTool::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn echo_succeeds() {
        let output = tool()
            .execute(serde_json::json!({"command": "echo hello"}))
            .await
            .unwrap();
        assert_eq!(output.content.trim(), "hello");
        assert!(output.success);
    }

    #[tokio::test]
    async fn nonzero_exit_is_unsuccessful_output() {
        let output = tool()
            .execute(serde_json::json!({"command": "echo oops >&2; exit 3"}))
            .await
            .unwrap();
        assert!(!output.success);
        assert!(output.content.contains("Exit code: 3"));
        assert!(output.content.contains("oops"));
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let err = tool().execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, WrenError::ToolExecution { .. }));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let tool = ShellTool::new(Duration::from_millis(100));
        let err = tool
            .execute(serde_json::json!({"command": "sleep 5"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WrenError::ToolExecution {
                kind: ToolErrorKind::Timeout,
                ..
            }
        ));
    }

    #[test]
    fn long_output_is_truncated() {
        let long = "x".repeat(MAX_OUTPUT_SIZE + 10);
        let cut = truncate(&long);
        assert!(cut.contains("[output truncated"));
        assert!(cut.len() < long.len() + 64);
    }
}
