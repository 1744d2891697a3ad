// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The combined, tenant-bound persister handle.

use crate::traits::courier::CourierPersister;
use crate::traits::flow::LoginFlowPersister;
use crate::types::TenantId;

/// A cheap, immutable view of the store bound to exactly one tenant.
///
/// Every read and write issued through the handle is filtered by
/// [`Persister::tenant_id`]. Rebinding never mutates the handle; it returns a
/// new one.
pub trait Persister: CourierPersister + LoginFlowPersister {
    /// The tenant every operation on this handle is scoped to.
    fn tenant_id(&self) -> TenantId;

    /// Returns a copy of this handle scoped to `tenant`.
    fn with_tenant(&self, tenant: TenantId) -> Self
    where
        Self: Sized;
}
