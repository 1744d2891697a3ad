// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Warden integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp SQLite database, initialized storage, manual clock
//! - [`fixtures`] - builders for realistic messages and login flows

pub mod fixtures;
pub mod harness;

pub use fixtures::{fake_login_flow, fake_message};
pub use harness::TestHarness;
