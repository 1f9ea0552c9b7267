// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use wren_config::model::StorageConfig;
use wren_core::{
    AdapterType, Chat, Conversation, HealthStatus, Message, NewMessage, PluginAdapter,
    StorageAdapter, WrenError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, WrenError> {
        self.db.get().ok_or_else(|| WrenError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WrenError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WrenError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| WrenError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WrenError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Chats ---

    async fn get_or_create_chat(&self, channel: &str, external_id: &str) -> Result<Chat, WrenError> {
        queries::chats::get_or_create_chat(self.db()?, channel, external_id).await
    }

    async fn get_chat(&self, id: &str) -> Result<Option<Chat>, WrenError> {
        queries::chats::get_chat(self.db()?, id).await
    }

    // --- Conversations ---

    async fn create_conversation(
        &self,
        chat_id: &str,
        make_current: bool,
    ) -> Result<Conversation, WrenError> {
        queries::conversations::create_conversation(self.db()?, chat_id, make_current).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, WrenError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn find_conversation_by_label(
        &self,
        chat_id: &str,
        label: &str,
    ) -> Result<Option<Conversation>, WrenError> {
        queries::conversations::find_by_label(self.db()?, chat_id, label).await
    }

    async fn current_conversation(&self, chat_id: &str) -> Result<Option<Conversation>, WrenError> {
        queries::conversations::current_conversation(self.db()?, chat_id).await
    }

    async fn list_conversations(&self, chat_id: &str) -> Result<Vec<Conversation>, WrenError> {
        queries::conversations::list_conversations(self.db()?, chat_id).await
    }

    async fn set_current_conversation(
        &self,
        chat_id: &str,
        conversation_id: &str,
    ) -> Result<Conversation, WrenError> {
        queries::conversations::set_current(self.db()?, chat_id, conversation_id).await
    }

    async fn set_archived(&self, conversation_id: &str, archived: bool) -> Result<(), WrenError> {
        queries::conversations::set_archived(self.db()?, conversation_id, archived).await
    }

    async fn archive_and_replace(
        &self,
        chat_id: &str,
        conversation_id: &str,
    ) -> Result<(Conversation, Conversation), WrenError> {
        queries::conversations::archive_and_replace(self.db()?, chat_id, conversation_id).await
    }

    async fn set_label(&self, conversation_id: &str, label: Option<&str>) -> Result<(), WrenError> {
        queries::conversations::set_label(self.db()?, conversation_id, label).await
    }

    async fn set_verbose(&self, conversation_id: &str, verbose: bool) -> Result<(), WrenError> {
        queries::conversations::set_verbose(self.db()?, conversation_id, verbose).await
    }

    async fn add_token_usage(
        &self,
        conversation_id: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<(), WrenError> {
        queries::conversations::add_token_usage(self.db()?, conversation_id, input_tokens, output_tokens)
            .await
    }

    // --- Messages ---

    async fn append_message(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Message, WrenError> {
        queries::messages::append_message(self.db()?, conversation_id, message).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, WrenError> {
        queries::messages::list_messages(self.db()?, conversation_id).await
    }

    async fn replace_message_prefix(
        &self,
        conversation_id: &str,
        count: usize,
        summary: &str,
    ) -> Result<(), WrenError> {
        queries::messages::replace_prefix(self.db()?, conversation_id, count, summary).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("test.db")));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
        assert_eq!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy("not initialized".into())
        );
    }

    #[tokio::test]
    async fn initialize_creates_nested_database_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("wren.db");
        let storage = SqliteStorage::new(make_config(&db_path));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("twice.db")));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("lazy.db")));
        assert!(storage.get_chat("x").await.is_err());
    }

    #[tokio::test]
    async fn close_checkpoints() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("close.db")));
        storage.initialize().await.unwrap();
        storage.get_or_create_chat("cli", "local").await.unwrap();
        storage.close().await.unwrap();
    }
}
