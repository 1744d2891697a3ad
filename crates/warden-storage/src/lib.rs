// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Warden persistence core.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! connection via `tokio-rusqlite`, generic tenant-scoped entity CRUD, the
//! claim-based courier queue, and login flow storage.

pub mod adapter;
pub mod codec;
pub mod database;
pub mod entity;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod scope;

pub use adapter::{SqlitePersister, SqliteStorage};
pub use database::Database;
pub use entity::Entity;
pub use scope::TenantScope;
