// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Backends implement [`PluginAdapter`] plus the storage traits, all via
//! `#[async_trait]` so they can be used as trait objects.

pub mod adapter;
pub mod storage;

pub use adapter::PluginAdapter;
pub use storage::{AccountDataStore, StorageAdapter};
