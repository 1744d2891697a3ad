// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant scoping for SQL statements.
//!
//! Every statement that touches a tenant-owned table builds its `WHERE`
//! clause and parameters through a [`TenantScope`]. The scope carries the
//! handle's tenant, never the tenant stored on the entity being written, so a
//! caller cannot reach another tenant's rows by editing `tenant_id` on a
//! record it holds.

use rusqlite::types::Value;
use uuid::Uuid;
use warden_core::{TenantId, WardenError};

use crate::codec::encode_uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    tenant: TenantId,
}

impl TenantScope {
    pub fn new(tenant: TenantId) -> Self {
        Self { tenant }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant
    }

    /// The tenant as a bindable parameter.
    pub fn tenant_param(&self) -> Value {
        encode_uuid(&self.tenant.0)
    }

    /// `nid = ?N`, for statements that address the tenant's whole table.
    pub fn tenant_predicate(&self, param: usize) -> String {
        format!("nid = ?{param}")
    }

    /// `id = ?N AND nid = ?N+1`, for statements that address one row.
    pub fn row_predicate(&self, first: usize) -> String {
        format!("id = ?{first} AND nid = ?{}", first + 1)
    }

    /// Parameters matching [`TenantScope::row_predicate`].
    pub fn row_params(&self, id: &Uuid) -> [Value; 2] {
        [encode_uuid(id), self.tenant_param()]
    }

    /// A row-addressed write that touched nothing either targeted a missing
    /// row or one owned by another tenant. Both surface as `NotFound`.
    pub fn expect_affected(&self, rows: usize) -> Result<(), WardenError> {
        if rows == 0 {
            Err(WardenError::NotFound)
        } else {
            Ok(())
        }
    }
}
