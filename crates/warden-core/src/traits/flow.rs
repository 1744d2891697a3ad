// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login flow persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::WardenError;
use crate::types::LoginFlow;

/// CRUD for login flows, scoped to the persister's tenant.
#[async_trait]
pub trait LoginFlowPersister: Send + Sync {
    /// Insert a new flow, assigning `id` if nil and stamping the tenant.
    async fn create_login_flow(&self, flow: &mut LoginFlow) -> Result<(), WardenError>;

    async fn get_login_flow(&self, id: Uuid) -> Result<LoginFlow, WardenError>;

    /// Overwrite every mutable column of the flow.
    ///
    /// `id` and `tenant_id` are only used to locate the row; they are never
    /// written.
    async fn update_login_flow(&self, flow: &LoginFlow) -> Result<(), WardenError>;

    async fn delete_login_flow(&self, id: Uuid) -> Result<(), WardenError>;
}
