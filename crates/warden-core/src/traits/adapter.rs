// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait implemented by storage backends.

use async_trait::async_trait;

use crate::error::WardenError;
use crate::types::HealthStatus;

/// Identity, lifecycle, and health check shared by every backend.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Performs a health check (`Ping`) and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, WardenError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), WardenError>;
}
