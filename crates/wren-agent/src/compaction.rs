// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarization of older conversation history.

use wren_core::{
    ContentBlock, Message, ProviderAdapter, ProviderMessage, ProviderRequest, Role, TokenUsage,
    WrenError,
};

const COMPACTION_PROMPT: &str = r#"You summarize conversations so they can continue with less context.

Keep:
- Facts the user stated about themselves, their goals and preferences
- Names, paths, identifiers and other concrete references
- Decisions made and why
- Commands or tools that were run and what they showed
- Open questions and unfinished work

Drop greetings, repetition, and attempts that were later corrected.

Write a short third-person summary in plain prose."#;

const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Asks the provider for a summary of `messages`.
///
/// Returns the summary text and the tokens spent producing it.
pub async fn summarize(
    provider: &dyn ProviderAdapter,
    messages: &[Message],
    model: &str,
) -> Result<(String, TokenUsage), WrenError> {
    let transcript = messages
        .iter()
        .map(|m| match (&m.role, &m.tool_call) {
            (Role::Assistant, Some(call)) => {
                format!("assistant: {} [called {} with {}]", m.content, call.name, call.input)
            }
            _ => format!("{}: {}", m.role, m.content),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let request = ProviderRequest {
        model: model.to_string(),
        system_prompt: Some(COMPACTION_PROMPT.to_string()),
        messages: vec![ProviderMessage {
            role: Role::User,
            content: vec![ContentBlock::Text {
                text: format!("Summarize this conversation:\n\n{transcript}"),
            }],
        }],
        tools: Vec::new(),
        max_tokens: SUMMARY_MAX_TOKENS,
    };

    let response = provider.complete(request).await?;
    let summary = response.text.trim();
    if summary.is_empty() {
        return Err(WrenError::Provider {
            message: "provider returned an empty summary".into(),
            source: None,
        });
    }

    tracing::info!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        summarized = messages.len(),
        "compaction summary generated"
    );

    Ok((summary.to_string(), response.usage))
}
