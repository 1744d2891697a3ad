// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the persister traits.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use warden_config::model::StorageConfig;
use warden_core::{
    Clock, CourierPersister, HealthStatus, LoginFlow, LoginFlowPersister, Message, MessageStatus,
    Persister, PluginAdapter, SystemClock, TenantId, WardenError,
};

use crate::database::Database;
use crate::queries;
use crate::scope::TenantScope;

/// SQLite-backed storage.
///
/// Owns the shared [`Database`] and hands out tenant-scoped
/// [`SqlitePersister`] handles. The database is opened on the first call to
/// [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
    clock: Arc<dyn Clock>,
}

impl SqliteStorage {
    /// Create storage for `config` using the system clock.
    ///
    /// Nothing is opened until [`SqliteStorage::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create storage whose timestamps come from `clock`.
    pub fn with_clock(config: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            clock,
        }
    }

    /// Open the database and apply pending migrations.
    pub async fn initialize(&self) -> Result<(), WardenError> {
        let db = Database::open_with_config(&self.config).await?;
        self.db
            .set(db)
            .map_err(|_| WardenError::Internal("storage already initialized".to_string()))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// The opened database, or an error if [`SqliteStorage::initialize`] has
    /// not run yet.
    pub fn database(&self) -> Result<&Database, WardenError> {
        self.db.get().ok_or_else(|| WardenError::BackendUnavailable {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// A handle scoped to `tenant`.
    pub fn persister(&self, tenant: TenantId) -> Result<SqlitePersister, WardenError> {
        Ok(SqlitePersister::new(
            self.database()?.clone(),
            tenant,
            Arc::clone(&self.clock),
        ))
    }

    /// Checkpoint the WAL and close the connection. Handles created earlier
    /// report [`WardenError::BackendUnavailable`] afterwards.
    pub async fn close(&self) -> Result<(), WardenError> {
        self.database()?.clone().close().await
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

    async fn health_check(&self) -> Result<HealthStatus, WardenError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        match db.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) if e.is_backend_unavailable() => {
                warn!(error = %e, "storage health check failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn shutdown(&self) -> Result<(), WardenError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

/// Tenant-bound view of the SQLite store.
///
/// Cloning is cheap. Every statement issued through the handle is filtered by
/// its tenant. If a cancellation token is attached and has fired, operations
/// fail with [`WardenError::Cancelled`] without touching the database.
#[derive(Clone)]
pub struct SqlitePersister {
    db: Database,
    scope: TenantScope,
    clock: Arc<dyn Clock>,
    cancel: Option<CancellationToken>,
}

impl SqlitePersister {
    pub fn new(db: Database, tenant: TenantId, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            scope: TenantScope::new(tenant),
            clock,
            cancel: None,
        }
    }

    /// A copy of this handle that stops issuing statements once `token` fires.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Overwrite only the named login flow columns.
    pub async fn update_login_flow_columns(
        &self,
        flow: &LoginFlow,
        columns: &[&str],
    ) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::login_flow::update_login_flow_columns(&self.db, &self.scope, flow, columns).await
    }

    fn ensure_live(&self) -> Result<(), WardenError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(WardenError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CourierPersister for SqlitePersister {
    async fn add_message(&self, message: &mut Message) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::courier::add_message(&self.db, &self.scope, self.clock.now(), message).await
    }

    async fn next_messages(&self, limit: usize) -> Result<Vec<Message>, WardenError> {
        self.ensure_live()?;
        queries::courier::next_messages(&self.db, &self.scope, self.clock.now(), limit).await
    }

    async fn latest_queued_message(&self) -> Result<Message, WardenError> {
        self.ensure_live()?;
        queries::courier::latest_queued_message(&self.db, &self.scope).await
    }

    async fn set_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::courier::set_message_status(&self.db, &self.scope, self.clock.now(), id, status)
            .await
    }

    async fn set_message_status_from(
        &self,
        id: Uuid,
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::courier::set_message_status_from(
            &self.db,
            &self.scope,
            self.clock.now(),
            id,
            from,
            to,
        )
        .await
    }

    async fn get_message(&self, id: Uuid) -> Result<Message, WardenError> {
        self.ensure_live()?;
        queries::courier::get_message(&self.db, &self.scope, id).await
    }
}

#[async_trait]
impl LoginFlowPersister for SqlitePersister {
    async fn create_login_flow(&self, flow: &mut LoginFlow) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::login_flow::create_login_flow(&self.db, &self.scope, flow).await
    }

    async fn get_login_flow(&self, id: Uuid) -> Result<LoginFlow, WardenError> {
        self.ensure_live()?;
        queries::login_flow::get_login_flow(&self.db, &self.scope, id).await
    }

    async fn update_login_flow(&self, flow: &LoginFlow) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::login_flow::update_login_flow(&self.db, &self.scope, flow).await
    }

    async fn delete_login_flow(&self, id: Uuid) -> Result<(), WardenError> {
        self.ensure_live()?;
        queries::login_flow::delete_login_flow(&self.db, &self.scope, id).await
    }
}

impl Persister for SqlitePersister {
    fn tenant_id(&self) -> TenantId {
        self.scope.tenant_id()
    }

    fn with_tenant(&self, tenant: TenantId) -> Self {
        Self {
            scope: TenantScope::new(tenant),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::{TempDir, tempdir};
    use warden_core::ManualClock;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn setup() -> (SqliteStorage, Arc<ManualClock>, TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("adapter.db").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let clock = Arc::new(ManualClock::new(start()));
        let storage = SqliteStorage::with_clock(config, clock.clone());
        storage.initialize().await.unwrap();
        (storage, clock, dir)
    }

    #[tokio::test]
    async fn persister_before_initialize_is_unavailable() {
        let storage = SqliteStorage::new(StorageConfig::default());
        let err = storage.persister(TenantId::new_v4()).err().unwrap();
        assert!(err.is_backend_unavailable());
        assert_eq!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy("not initialized".to_string())
        );
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let (storage, _clock, _dir) = setup().await;
        assert!(matches!(
            storage.initialize().await,
            Err(WardenError::Internal(_))
        ));
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn health_tracks_connection_state() {
        let (storage, _clock, _dir) = setup().await;
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        storage.shutdown().await.unwrap();

        storage.close().await.unwrap();
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn timestamps_come_from_injected_clock() {
        let (storage, clock, _dir) = setup().await;
        let p = storage.persister(TenantId::new_v4()).unwrap();

        let mut msg = Message::email("a@example.com", "s", "b");
        p.add_message(&mut msg).await.unwrap();
        assert_eq!(msg.created_at, start());

        clock.advance(Duration::minutes(5));
        let claimed = p.next_messages(1).await.unwrap();
        assert_eq!(claimed[0].created_at, start());
        assert_eq!(claimed[0].updated_at, start() + Duration::minutes(5));
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn with_tenant_rebinds_without_mutating_original() {
        let (storage, _clock, _dir) = setup().await;
        let a = storage.persister(TenantId::new_v4()).unwrap();
        let b_id = TenantId::new_v4();
        let b = a.with_tenant(b_id);

        assert_ne!(a.tenant_id(), b.tenant_id());
        assert_eq!(b.tenant_id(), b_id);

        let mut msg = Message::email("a@example.com", "s", "b");
        a.add_message(&mut msg).await.unwrap();
        assert!(b.get_message(msg.id).await.unwrap_err().is_not_found());
        assert_eq!(a.get_message(msg.id).await.unwrap().id, msg.id);
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_handle_issues_no_statements() {
        let (storage, _clock, _dir) = setup().await;
        let token = CancellationToken::new();
        let p = storage.persister(TenantId::new_v4()).unwrap();
        let guarded = p.with_cancellation(token.clone());

        let mut before = Message::email("a@example.com", "s", "b");
        guarded.add_message(&mut before).await.unwrap();

        token.cancel();
        let mut after = Message::email("b@example.com", "s", "b");
        assert!(matches!(
            guarded.add_message(&mut after).await,
            Err(WardenError::Cancelled)
        ));
        assert!(matches!(
            guarded.next_messages(1).await,
            Err(WardenError::Cancelled)
        ));

        // The message enqueued before cancellation is still queued, and the
        // uncancelled handle still works.
        assert_eq!(p.next_messages(10).await.unwrap().len(), 1);
        storage.close().await.unwrap();
    }
}
