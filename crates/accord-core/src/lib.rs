// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Accord account data store.
//!
//! Holds the error type, the domain types (localparts, room scopes, opaque
//! JSON content, the grouped read shape), the request context, and the
//! adapter traits storage backends implement.

pub mod context;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use context::RequestContext;
pub use error::AccordError;
pub use traits::{AccountDataStore, PluginAdapter, StorageAdapter};
pub use types::{
    AccountData, AccountDataRecord, HealthStatus, JsonContent, Localpart, RoomId, RoomScope,
    TypedContent,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_store(_: &dyn AccountDataStore) {}
        fn _assert_adapter(_: &dyn PluginAdapter) {}
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }
}
