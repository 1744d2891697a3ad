// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, migrations, health, close.
//!
//! All statements issued through one [`Database`] run on tokio-rusqlite's
//! single background thread, so they are serialized with respect to each
//! other. Claims additionally take the SQLite write lock up front
//! (`BEGIN IMMEDIATE`) so that separate `Database` handles on the same file,
//! including ones in other processes, cannot interleave a claim either.

use std::path::Path;
use std::time::Duration;

use rusqlite::ErrorCode;
use tracing::{debug, info};
use warden_config::model::StorageConfig;
use warden_core::WardenError;

use crate::migrations;

/// Handle to the SQLite database. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` with default settings
    /// and bring its schema up to date.
    pub async fn open(path: &str) -> Result<Self, WardenError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with_config(&config).await
    }

    /// Open the database described by `config` and apply pending migrations.
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, WardenError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| WardenError::BackendUnavailable {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(map_sqlite_err)?;

        let wal_mode = config.wal_mode;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        conn.call(move |conn| -> Result<(), WardenError> {
            apply_pragmas(conn, wal_mode, busy_timeout).map_err(map_sqlite_err)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(map_call_err)?;

        info!(path = %path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Round-trip a trivial statement to prove the backend is reachable.
    pub async fn ping(&self) -> Result<(), WardenError> {
        self.conn
            .call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map_err(map_tr_err)?;
        Ok(())
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), WardenError> {
        self.conn
            .call(|conn| conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())))
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoint and close the connection. Other clones become unusable and
    /// report [`WardenError::BackendUnavailable`].
    pub async fn close(self) -> Result<(), WardenError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

fn apply_pragmas(
    conn: &rusqlite::Connection,
    wal_mode: bool,
    busy_timeout: Duration,
) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    if wal_mode {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Translate a SQLite error into the storage error taxonomy.
pub fn map_sqlite_err(e: rusqlite::Error) -> WardenError {
    let code = match &e {
        rusqlite::Error::QueryReturnedNoRows => return WardenError::NotFound,
        rusqlite::Error::SqliteFailure(err, _) => Some(err.code),
        _ => None,
    };

    match code {
        Some(ErrorCode::ConstraintViolation) => WardenError::ConstraintViolation {
            source: Box::new(e),
        },
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase
            | ErrorCode::DiskFull
            | ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly
            | ErrorCode::FileLockingProtocolFailed,
        ) => WardenError::BackendUnavailable {
            source: Box::new(e),
        },
        _ => WardenError::Storage {
            source: Box::new(e),
        },
    }
}

/// Translate a tokio-rusqlite error whose closure failed with a SQLite error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WardenError {
    match e {
        tokio_rusqlite::Error::Error(inner) => map_sqlite_err(inner),
        other => WardenError::BackendUnavailable {
            source: Box::new(other),
        },
    }
}

/// Translate a tokio-rusqlite error whose closure already produced a [`WardenError`].
pub fn map_call_err(e: tokio_rusqlite::Error<WardenError>) -> WardenError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => WardenError::BackendUnavailable {
            source: other.to_string().into(),
        },
    }
}
