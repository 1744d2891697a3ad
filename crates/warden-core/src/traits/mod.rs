// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for storage adapters and tenant-scoped persisters.
//!
//! All async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod courier;
pub mod flow;
pub mod persister;

pub use adapter::PluginAdapter;
pub use courier::CourierPersister;
pub use flow::LoginFlowPersister;
pub use persister::Persister;
