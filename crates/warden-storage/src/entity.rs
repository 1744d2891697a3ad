// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic tenant-scoped CRUD primitives.
//!
//! Each persisted type describes its table through [`Entity`]: an explicit,
//! ordered column map used for both writing and reading. The functions in
//! this module build SQL from that map and route every row-addressed
//! statement through a [`TenantScope`].

use rusqlite::Row;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::debug;
use uuid::Uuid;
use warden_core::{TenantId, WardenError};

use crate::codec::encode_uuid;
use crate::database::{Database, map_tr_err};
use crate::scope::TenantScope;

/// A record stored in one tenant-owned table keyed by `id` and `nid`.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Columns in the order [`Entity::from_row`] reads them. Always starts
    /// with `id, nid`.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;
    fn set_id(&mut self, id: Uuid);
    fn tenant_id(&self) -> TenantId;
    fn set_tenant_id(&mut self, tenant: TenantId);

    /// Every writable column with its encoded value, in table order.
    ///
    /// `id` and `nid` are never included: they are written once on insert
    /// and are not updatable.
    fn values(&self) -> Result<Vec<(&'static str, Value)>, WardenError>;

    /// Decode a row selected with [`Entity::COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// `SELECT <columns> FROM <table>` for `E`.
pub fn select_from<E: Entity>() -> String {
    format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

/// Insert `entity` under the scope's tenant, assigning an id if it is nil.
pub async fn insert<E: Entity>(
    db: &Database,
    scope: &TenantScope,
    entity: &mut E,
) -> Result<(), WardenError> {
    if entity.id().is_nil() {
        entity.set_id(Uuid::new_v4());
    }
    entity.set_tenant_id(scope.tenant_id());

    let mut columns = vec!["id", "nid"];
    let mut params = vec![encode_uuid(&entity.id()), scope.tenant_param()];
    for (column, value) in entity.values()? {
        columns.push(column);
        params.push(value);
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::TABLE,
        columns.join(", "),
        placeholders.join(", ")
    );

    db.connection()
        .call(move |conn| conn.execute(&sql, params_from_iter(params)))
        .await
        .map_err(map_tr_err)?;
    debug!(table = E::TABLE, id = %entity.id(), tenant = %scope.tenant_id(), "inserted");
    Ok(())
}

/// Update the named columns of the row addressed by `entity.id()`.
///
/// An empty `columns` slice updates every writable column. Naming a column
/// the entity does not map (including `id` and `nid`) fails with
/// [`WardenError::UnknownColumn`] before any statement is issued.
pub async fn update_columns<E: Entity>(
    db: &Database,
    scope: &TenantScope,
    entity: &E,
    columns: &[&str],
) -> Result<(), WardenError> {
    let mut values = entity.values()?;
    if !columns.is_empty() {
        if let Some(unknown) = columns
            .iter()
            .find(|c| !values.iter().any(|(name, _)| name == *c))
        {
            return Err(WardenError::UnknownColumn {
                table: E::TABLE.to_string(),
                column: unknown.to_string(),
            });
        }
        values.retain(|(name, _)| columns.contains(name));
    }

    let assignments: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
        .collect();
    let mut params: Vec<Value> = values.into_iter().map(|(_, value)| value).collect();
    let predicate = scope.row_predicate(params.len() + 1);
    params.extend(scope.row_params(&entity.id()));
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        E::TABLE,
        assignments.join(", "),
        predicate
    );

    let rows = db
        .connection()
        .call(move |conn| conn.execute(&sql, params_from_iter(params)))
        .await
        .map_err(map_tr_err)?;
    if rows == 0 {
        debug!(table = E::TABLE, id = %entity.id(), tenant = %scope.tenant_id(), "update matched no row");
    }
    scope.expect_affected(rows)
}

/// Point lookup by id within the scope's tenant.
pub async fn get<E: Entity>(
    db: &Database,
    scope: &TenantScope,
    id: Uuid,
) -> Result<E, WardenError> {
    let sql = format!("{} WHERE {}", select_from::<E>(), scope.row_predicate(1));
    let params = scope.row_params(&id);
    db.connection()
        .call(move |conn| conn.query_row(&sql, params_from_iter(params), E::from_row))
        .await
        .map_err(map_tr_err)
}

/// Delete the row with `id` within the scope's tenant.
pub async fn delete<E: Entity>(
    db: &Database,
    scope: &TenantScope,
    id: Uuid,
) -> Result<(), WardenError> {
    let sql = format!("DELETE FROM {} WHERE {}", E::TABLE, scope.row_predicate(1));
    let params = scope.row_params(&id);
    let rows = db
        .connection()
        .call(move |conn| conn.execute(&sql, params_from_iter(params)))
        .await
        .map_err(map_tr_err)?;
    scope.expect_affected(rows)
}
