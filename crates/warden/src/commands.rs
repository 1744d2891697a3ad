// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier, flow, and migration subcommands.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use warden_config::model::WardenConfig;
use warden_core::{
    CheckedCourier, CourierPersister, LoginFlowPersister, Message, MessageStatus, MessageType,
    TenantId, WardenError,
};
use warden_storage::{Database, SqlitePersister, SqliteStorage, migrations};

/// Pick the tenant from `--tenant`, falling back to `tenant.default_id`.
pub fn resolve_tenant(flag: Option<&str>, config: &WardenConfig) -> Result<TenantId, WardenError> {
    let raw = flag
        .or(config.tenant.default_id.as_deref())
        .ok_or_else(|| {
            WardenError::Config("no tenant given: pass --tenant or set tenant.default_id".into())
        })?;
    raw.parse()
        .map_err(|e| WardenError::Config(format!("invalid tenant id `{raw}`: {e}")))
}

async fn open_persister(
    config: &WardenConfig,
    tenant: TenantId,
) -> Result<(SqliteStorage, SqlitePersister), WardenError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let persister = storage.persister(tenant)?;
    Ok((storage, persister))
}

/// Close the storage after the command's outcome has been reported.
///
/// Whatever the command wrote is already committed, so a failed checkpoint or
/// close is logged and printed as a warning rather than failing the command.
async fn close_after_output(storage: &SqliteStorage) {
    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close database cleanly");
        eprintln!("warden: warning: failed to close database cleanly: {e}");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), WardenError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| WardenError::Internal(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

pub async fn migrate_up(config: &WardenConfig) -> Result<(), WardenError> {
    let db = Database::open_with_config(&config.storage).await?;
    let applied = migrations::status(&db).await?;
    db.close().await?;
    info!(count = applied.len(), "schema up to date");
    println!(
        "schema at version {} ({} migration(s) applied)",
        applied.last().map(|m| m.version).unwrap_or(0),
        applied.len()
    );
    Ok(())
}

pub async fn migrate_status(config: &WardenConfig) -> Result<(), WardenError> {
    let db = Database::open_with_config(&config.storage).await?;
    let applied = migrations::status(&db).await?;
    db.close().await?;

    for migration in migrations::embedded_versions() {
        let mark = if applied.iter().any(|a| a.version == migration.version) {
            "applied"
        } else {
            "pending"
        };
        println!("V{:<4} {:<32} {mark}", migration.version, migration.name);
    }
    Ok(())
}

pub async fn migrate_rollback(config: &WardenConfig, steps: usize) -> Result<(), WardenError> {
    let db = Database::open_with_config(&config.storage).await?;
    let result = migrations::rollback(&db, steps).await;
    db.close().await?;
    result
}

pub async fn courier_enqueue(
    config: &WardenConfig,
    tenant: TenantId,
    recipient: String,
    subject: String,
    body: String,
    message_type: MessageType,
) -> Result<(), WardenError> {
    let (storage, persister) = open_persister(config, tenant).await?;
    let mut message = Message {
        message_type,
        ..Message::email(recipient, subject, body)
    };
    let result = persister.add_message(&mut message).await;
    if result.is_ok() {
        println!("{}", message.id);
    }
    close_after_output(&storage).await;
    result
}

pub async fn courier_claim(
    config: &WardenConfig,
    tenant: TenantId,
    limit: usize,
) -> Result<(), WardenError> {
    let (storage, persister) = open_persister(config, tenant).await?;
    let result = match persister.next_messages(limit).await {
        Ok(messages) => print_json(&messages),
        Err(WardenError::QueueEmpty) => {
            println!("queue is empty");
            Ok(())
        }
        Err(e) => Err(e),
    };
    close_after_output(&storage).await;
    result
}

pub async fn courier_latest(config: &WardenConfig, tenant: TenantId) -> Result<(), WardenError> {
    let (storage, persister) = open_persister(config, tenant).await?;
    let result = match persister.latest_queued_message().await {
        Ok(message) => print_json(&message),
        Err(WardenError::QueueEmpty) => {
            println!("queue is empty");
            Ok(())
        }
        Err(e) => Err(e),
    };
    close_after_output(&storage).await;
    result
}

pub async fn courier_mark(
    config: &WardenConfig,
    tenant: TenantId,
    id: Uuid,
    status: MessageStatus,
    force: bool,
) -> Result<(), WardenError> {
    let (storage, persister) = open_persister(config, tenant).await?;
    let result = if force {
        persister.set_message_status(id, status).await
    } else {
        CheckedCourier::new(persister)
            .set_message_status(id, status)
            .await
    };
    if result.is_ok() {
        println!("{id} -> {status}");
    }
    close_after_output(&storage).await;
    result
}

pub async fn courier_show(
    config: &WardenConfig,
    tenant: TenantId,
    id: Uuid,
) -> Result<(), WardenError> {
    let (storage, persister) = open_persister(config, tenant).await?;
    let result = persister.get_message(id).await.and_then(|m| print_json(&m));
    close_after_output(&storage).await;
    result
}

pub async fn flow_show(config: &WardenConfig, tenant: TenantId, id: Uuid) -> Result<(), WardenError> {
    let (storage, persister) = open_persister(config, tenant).await?;
    let result = persister
        .get_login_flow(id)
        .await
        .and_then(|flow| print_json(&flow));
    close_after_output(&storage).await;
    result
}
