// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login flow CRUD.

use uuid::Uuid;
use warden_core::{LoginFlow, WardenError};

use crate::database::Database;
use crate::entity;
use crate::scope::TenantScope;

pub async fn create_login_flow(
    db: &Database,
    scope: &TenantScope,
    flow: &mut LoginFlow,
) -> Result<(), WardenError> {
    entity::insert(db, scope, flow).await
}

pub async fn get_login_flow(
    db: &Database,
    scope: &TenantScope,
    id: Uuid,
) -> Result<LoginFlow, WardenError> {
    entity::get(db, scope, id).await
}

/// Overwrite every column of the flow except `id` and `nid`.
///
/// The UI document is always written back whole, so updating a flow that was
/// just read leaves the row unchanged.
pub async fn update_login_flow(
    db: &Database,
    scope: &TenantScope,
    flow: &LoginFlow,
) -> Result<(), WardenError> {
    entity::update_columns(db, scope, flow, &[]).await
}

/// Overwrite only the named columns.
pub async fn update_login_flow_columns(
    db: &Database,
    scope: &TenantScope,
    flow: &LoginFlow,
    columns: &[&str],
) -> Result<(), WardenError> {
    entity::update_columns(db, scope, flow, columns).await
}

pub async fn delete_login_flow(
    db: &Database,
    scope: &TenantScope,
    id: Uuid,
) -> Result<(), WardenError> {
    entity::delete::<LoginFlow>(db, scope, id).await
}
