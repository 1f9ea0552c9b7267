// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in web search tool backed by a JSON search endpoint.
//!
//! The endpoint is queried with `GET {endpoint}?q=<query>&count=<n>` and must
//! answer `{"results": [{"title": .., "url": .., "snippet": ..}]}`.

use async_trait::async_trait;
use serde::Deserialize;
use wren_core::{ToolErrorKind, WrenError};

use crate::tool::{Tool, ToolOutput};

const DEFAULT_RESULT_COUNT: u64 = 5;
const MAX_RESULT_COUNT: u64 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
}

/// Queries a search API and returns a numbered list of hits.
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WebSearchTool {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

fn classify_transport(e: &reqwest::Error) -> ToolErrorKind {
    if e.is_timeout() {
        ToolErrorKind::Timeout
    } else if e.is_connect() {
        ToolErrorKind::ConnectionRefused
    } else if e.is_decode() {
        ToolErrorKind::MalformedResponse
    } else {
        ToolErrorKind::Other
    }
}

fn classify_status(status: reqwest::StatusCode) -> ToolErrorKind {
    match status.as_u16() {
        404 => ToolErrorKind::NotFound,
        401 | 403 => ToolErrorKind::PermissionDenied,
        _ => ToolErrorKind::Other,
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return the top results with titles, URLs and snippets"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for"
                },
                "count": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_RESULT_COUNT,
                    "description": "Number of results to return"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, WrenError> {
        let query = arguments["query"].as_str().ok_or_else(|| {
            WrenError::tool("web_search", ToolErrorKind::Other, "missing required 'query' parameter")
        })?;
        let count = arguments["count"]
            .as_u64()
            .unwrap_or(DEFAULT_RESULT_COUNT)
            .clamp(1, MAX_RESULT_COUNT);

        let url = reqwest::Url::parse_with_params(
            &self.endpoint,
            &[("q", query.to_string()), ("count", count.to_string())],
        )
        .map_err(|e| {
            WrenError::tool("web_search", ToolErrorKind::Other, format!("invalid endpoint: {e}"))
        })?;

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            WrenError::tool("web_search", classify_transport(&e), format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WrenError::tool(
                "web_search",
                classify_status(status),
                format!("search endpoint returned {status}"),
            ));
        }

        let body = response.text().await.map_err(|e| {
            WrenError::tool("web_search", classify_transport(&e), format!("failed to read body: {e}"))
        })?;
        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            WrenError::tool(
                "web_search",
                ToolErrorKind::MalformedResponse,
                format!("unexpected response shape: {e}"),
            )
        })?;

        if parsed.results.is_empty() {
            return Ok(ToolOutput::ok(format!("No results for \"{query}\".")));
        }

        let lines: Vec<String> = parsed
            .results
            .iter()
            .take(count as usize)
            .enumerate()
            .map(|(i, r)| format!("{}. {}\n   {}\n   {}", i + 1, r.title, r.url, r.snippet))
            .collect();
        Ok(ToolOutput::ok(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn formats_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .and(header("authorization", "Bearer k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"title": "Rust", "url": "https://rust-lang.org", "snippet": "A language"},
                    {"title": "Crates", "url": "https://crates.io"}
                ]
            })))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(format!("{}/search", server.uri()), Some("k".into()));
        let output = tool
            .execute(serde_json::json!({"query": "rust"}))
            .await
            .unwrap();
        assert!(output.success);
        assert!(output.content.starts_with("1. Rust"));
        assert!(output.content.contains("2. Crates"));
    }

    #[tokio::test]
    async fn forbidden_maps_to_permission_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(server.uri(), None);
        let err = tool
            .execute(serde_json::json!({"query": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WrenError::ToolExecution {
                kind: ToolErrorKind::PermissionDenied,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn garbage_body_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(server.uri(), None);
        let err = tool
            .execute(serde_json::json!({"query": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WrenError::ToolExecution {
                kind: ToolErrorKind::MalformedResponse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn closed_port_is_connection_refused() {
        // Nothing listens on port 1.
        let tool = WebSearchTool::new("http://127.0.0.1:1/search", None);
        let err = tool
            .execute(serde_json::json!({"query": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WrenError::ToolExecution {
                kind: ToolErrorKind::ConnectionRefused,
                ..
            }
        ));
    }
}
