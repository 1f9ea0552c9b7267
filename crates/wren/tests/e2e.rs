// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the assembled runtime with a scripted provider.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wren::Runtime;
use wren::serve::serve_until;
use wren_config::model::{StorageConfig, WrenConfig};
use wren_core::{Role, StorageAdapter};
use wren_test_utils::{MockProvider, MockReply};

struct Setup {
    runtime: Runtime,
    provider: Arc<MockProvider>,
    _dir: tempfile::TempDir,
}

async fn setup(provider: MockProvider) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let mut config = WrenConfig::default();
    config.storage = StorageConfig {
        database_path: dir.path().join("wren.db").to_string_lossy().into_owned(),
    };
    config.agent.retry_backoff_ms = 1;
    config.channels.join_timeout_secs = 1;
    config.channels.exclude = vec!["terminal".into()];

    let provider = Arc::new(provider);
    let runtime = Runtime::with_provider(config, provider.clone()).await.unwrap();
    Setup {
        runtime,
        provider,
        _dir: dir,
    }
}

#[tokio::test]
async fn send_answers_and_persists_the_turn() {
    let s = setup(MockProvider::with_responses(vec!["Hello from Wren!"])).await;

    let reply = s.runtime.send("local", "Hi there").await.unwrap();
    assert_eq!(reply, "Hello from Wren!");

    let chat = s.runtime.storage.get_or_create_chat("cli", "local").await.unwrap();
    let conversation = s
        .runtime
        .storage
        .current_conversation(&chat.id)
        .await
        .unwrap()
        .unwrap();
    let messages = s.runtime.storage.list_messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Hi there");
    assert_eq!(messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn consecutive_sends_share_the_current_conversation() {
    let s = setup(MockProvider::with_responses(vec!["one", "two"])).await;
    s.runtime.send("local", "first").await.unwrap();
    s.runtime.send("local", "second").await.unwrap();

    let requests = s.provider.requests().await;
    assert_eq!(requests.len(), 2);
    // The second call carries the whole history.
    assert_eq!(requests[1].messages.len(), 3);
}

#[tokio::test]
async fn commands_work_from_the_command_line() {
    let s = setup(MockProvider::new()).await;

    assert_eq!(
        s.runtime.send("local", "/label work").await.unwrap(),
        "Labelled this conversation 'work'."
    );
    let reply = s.runtime.send("local", "/new").await.unwrap();
    assert!(reply.starts_with("Started a new conversation"));
    let listing = s.runtime.send("local", "/list").await.unwrap();
    assert!(listing.contains("work"));
    assert_eq!(s.provider.call_count(), 0);
}

#[tokio::test]
async fn builtin_shell_tool_is_available() {
    let s = setup(MockProvider::with_replies(vec![
        MockReply::tool_call("shell", serde_json::json!({"command": "echo wren-e2e"})),
        MockReply::text("It printed wren-e2e."),
    ]))
    .await;

    let reply = s.runtime.send("local", "run echo").await.unwrap();
    assert_eq!(reply, "It printed wren-e2e.");

    let requests = s.provider.requests().await;
    assert!(requests[0].tools.iter().any(|t| t.name == "shell"));
    let observation = requests[1].messages.last().unwrap();
    assert!(format!("{:?}", observation.content).contains("wren-e2e"));
}

#[tokio::test]
async fn serve_skips_unconfigured_telegram_and_stops_on_signal() {
    let s = setup(MockProvider::new()).await;
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(10), serve_until(&s.runtime, shutdown))
        .await
        .expect("serve should return once shut down")
        .unwrap();
}
