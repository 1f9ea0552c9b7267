// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Wren agent runtime.
//!
//! WAL-mode SQLite with embedded migrations, a single background connection
//! via `tokio-rusqlite`, and typed query modules for chats, conversations and
//! messages. Multi-row state transitions each run in one transaction.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
