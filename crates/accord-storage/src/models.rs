// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for stored account data.
//!
//! The canonical types live in `accord-core::types` so they can cross the
//! adapter trait boundary. Re-exported here for use inside the storage crate.

pub use accord_core::types::{
    AccountData, AccountDataRecord, JsonContent, Localpart, RoomScope, TypedContent,
};
