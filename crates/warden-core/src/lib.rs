// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Warden persistence core.
//!
//! This crate provides the domain types (courier messages, login flows,
//! tenant identifiers), the error taxonomy, the clock abstraction, and the
//! persister traits every storage backend implements.

pub mod checked;
pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use checked::CheckedCourier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::WardenError;
pub use types::{
    FlowType, HealthStatus, LoginFlow, Message, MessageStatus, MessageType, TenantId, UiContainer,
};

pub use traits::{CourierPersister, LoginFlowPersister, Persister, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_exported() {
        // Fails to compile if a trait goes missing from the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_courier<T: CourierPersister>() {}
        fn _assert_login_flow<T: LoginFlowPersister>() {}
        fn _assert_persister<T: Persister>() {}
        fn _assert_clock<T: Clock>() {}
    }

    #[test]
    fn checked_courier_is_itself_a_courier() {
        fn _assert<P: CourierPersister>() {
            fn _inner<C: CourierPersister>() {}
            _inner::<CheckedCourier<P>>();
        }
    }
}
