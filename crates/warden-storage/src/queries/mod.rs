// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant-scoped query modules, one per entity family.

pub mod courier;
pub mod login_flow;
