// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations using refinery.
//!
//! The SQL files under `migrations/` are compiled into the binary via
//! `embed_migrations!` and applied every time a [`crate::Database`] is opened.

use warden_core::WardenError;

use crate::database::Database;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// One row of the migration history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
}

/// Apply every pending migration.
///
/// Refinery records applied versions in its `refinery_schema_history` table,
/// so running this against an up-to-date schema is a no-op.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), WardenError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| WardenError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(
            version = i64::from(migration.version()),
            name = migration.name(),
            "applied migration"
        );
    }
    Ok(())
}

/// Versions the database has applied, oldest first.
pub async fn status(db: &Database) -> Result<Vec<AppliedMigration>, WardenError> {
    db.connection()
        .call(|conn| -> Result<Vec<AppliedMigration>, WardenError> {
            let applied = embedded::migrations::runner()
                .get_applied_migrations(conn)
                .map_err(|e| WardenError::Storage {
                    source: Box::new(e),
                })?;
            Ok(applied
                .iter()
                .map(|m| AppliedMigration {
                    version: i64::from(m.version()),
                    name: m.name().to_string(),
                })
                .collect())
        })
        .await
        .map_err(crate::database::map_call_err)
}

/// Versions compiled into this build, oldest first.
pub fn embedded_versions() -> Vec<AppliedMigration> {
    let mut versions: Vec<AppliedMigration> = embedded::migrations::runner()
        .get_migrations()
        .iter()
        .map(|m| AppliedMigration {
            version: i64::from(m.version()),
            name: m.name().to_string(),
        })
        .collect();
    versions.sort_by_key(|m| m.version);
    versions
}

/// Roll back the last `steps` migrations.
///
/// The embedded migrations are forward-only; refinery ships no down scripts,
/// so this always fails without touching the schema.
pub async fn rollback(_db: &Database, steps: usize) -> Result<(), WardenError> {
    Err(WardenError::Internal(format!(
        "cannot roll back {steps} migration(s): embedded migrations are forward-only"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_lists_every_embedded_migration() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();

        let applied = status(&db).await.unwrap();
        assert_eq!(applied, embedded_versions());
        assert_eq!(applied.first().map(|m| m.version), Some(1));
        assert_eq!(applied.len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rollback_is_refused() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("r.db").to_str().unwrap())
            .await
            .unwrap();

        assert!(rollback(&db, 1).await.is_err());
        assert_eq!(status(&db).await.unwrap().len(), 2);

        db.close().await.unwrap();
    }
}
