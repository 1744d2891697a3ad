// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a fresh SQLite database in a temp directory, runs
//! migrations, and hands out tenant-scoped persisters whose timestamps come
//! from a [`ManualClock`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use warden_config::model::StorageConfig;
use warden_core::{ManualClock, TenantId, WardenError};
use warden_storage::{SqlitePersister, SqliteStorage};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    start: Option<DateTime<Utc>>,
    tenant: Option<TenantId>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            start: None,
            tenant: None,
        }
    }

    /// Start the manual clock at `start` instead of the current time.
    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Use `tenant` as the default tenant instead of a random one.
    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub async fn build(self) -> Result<TestHarness, WardenError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| WardenError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            ..StorageConfig::default()
        };
        let clock = Arc::new(ManualClock::new(self.start.unwrap_or_else(Utc::now)));
        let storage = SqliteStorage::with_clock(config.clone(), clock.clone());
        storage.initialize().await?;

        let tenant = self.tenant.unwrap_or_else(TenantId::new_v4);
        tracing::debug!(%tenant, path = %config.database_path, "test harness ready");

        Ok(TestHarness {
            storage,
            clock,
            tenant,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A migrated temp database plus the clock and tenant used to drive it.
pub struct TestHarness {
    /// Initialized storage (temp DB, removed on drop).
    pub storage: SqliteStorage,
    /// The clock every persister from this harness stamps rows with.
    pub clock: Arc<ManualClock>,
    /// Default tenant for [`TestHarness::persister`].
    pub tenant: TenantId,
    /// Storage configuration pointing at the temp database.
    pub config: StorageConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with a random tenant and the clock at the current time.
    pub async fn new() -> Result<Self, WardenError> {
        Self::builder().build().await
    }

    /// Persister scoped to the harness's default tenant.
    pub fn persister(&self) -> Result<SqlitePersister, WardenError> {
        self.storage.persister(self.tenant)
    }

    /// Persister scoped to a fresh random tenant.
    pub fn other_tenant(&self) -> Result<SqlitePersister, WardenError> {
        self.storage.persister(TenantId::new_v4())
    }

    /// A second, independently opened handle on the same database file.
    ///
    /// Useful for exercising claims that race across connections.
    pub async fn second_storage(&self) -> Result<SqliteStorage, WardenError> {
        let storage = SqliteStorage::with_clock(self.config.clone(), self.clock.clone());
        storage.initialize().await?;
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{CourierPersister, Persister};

    #[tokio::test]
    async fn harness_persister_uses_default_tenant() {
        let tenant = TenantId::new_v4();
        let harness = TestHarness::builder().with_tenant(tenant).build().await.unwrap();
        assert_eq!(harness.persister().unwrap().tenant_id(), tenant);
        assert_ne!(harness.other_tenant().unwrap().tenant_id(), tenant);
    }

    #[tokio::test]
    async fn second_storage_sees_same_rows() {
        let harness = TestHarness::new().await.unwrap();
        let mut msg = crate::fake_message(1);
        harness.persister().unwrap().add_message(&mut msg).await.unwrap();

        let second = harness.second_storage().await.unwrap();
        let found = second
            .persister(harness.tenant)
            .unwrap()
            .get_message(msg.id)
            .await
            .unwrap();
        assert_eq!(found, msg);
    }
}
