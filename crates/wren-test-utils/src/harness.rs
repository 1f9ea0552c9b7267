// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures: a temp SQLite store, a scripted provider, and a config
//! tuned for fast tests.

use std::sync::Arc;

use wren_config::model::{StorageConfig, WrenConfig};
use wren_core::{StorageAdapter, WrenError};
use wren_storage::SqliteStorage;

use crate::mock_provider::{MockProvider, MockReply};

/// Storage and provider fixtures backed by a temporary directory.
pub struct TestHarness {
    pub storage: Arc<SqliteStorage>,
    pub provider: Arc<MockProvider>,
    pub config: WrenConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// A harness whose provider always answers "mock response".
    pub async fn new() -> Result<Self, WrenError> {
        Self::with_provider(MockProvider::new()).await
    }

    /// A harness whose provider plays `replies`.
    pub async fn with_replies(replies: Vec<MockReply>) -> Result<Self, WrenError> {
        Self::with_provider(MockProvider::with_replies(replies)).await
    }

    pub async fn with_provider(provider: MockProvider) -> Result<Self, WrenError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| WrenError::Storage { source: e.into() })?;
        let database_path = temp_dir.path().join("test.db").to_string_lossy().into_owned();

        let mut config = WrenConfig::default();
        config.storage = StorageConfig {
            database_path: database_path.clone(),
        };
        config.agent.retry_backoff_ms = 1;
        config.channels.join_timeout_secs = 1;
        config.channels.monitor_interval_secs = 1;

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        Ok(Self {
            storage: Arc::new(storage),
            provider: Arc::new(provider),
            config,
            _temp_dir: temp_dir,
        })
    }
}
