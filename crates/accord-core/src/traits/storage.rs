// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter traits for account data backends (SQLite, etc.).

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::AccordError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AccountData, JsonContent, Localpart, RoomScope};

/// Lifecycle of a storage backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connections, etc.).
    async fn initialize(&self) -> Result<(), AccordError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), AccordError>;
}

/// Per-user keyed document store for global and room-scoped account data.
///
/// Writes replace a document wholesale and are serialized by the backend.
/// Reads may run concurrently with each other and with writes.
#[async_trait]
pub trait AccountDataStore: StorageAdapter {
    /// Insert or replace the content stored for (localpart, room, data_type).
    async fn set_account_data(
        &self,
        ctx: &RequestContext,
        localpart: &Localpart,
        room: &RoomScope,
        data_type: &str,
        content: &JsonContent,
    ) -> Result<(), AccordError>;

    /// All account data of a user, split into global and per-room maps.
    async fn get_account_data(
        &self,
        ctx: &RequestContext,
        localpart: &Localpart,
    ) -> Result<AccountData, AccordError>;

    /// Content for an exact triple. `Ok(None)` when nothing was stored.
    async fn get_account_data_by_type(
        &self,
        ctx: &RequestContext,
        localpart: &Localpart,
        room: &RoomScope,
        data_type: &str,
    ) -> Result<Option<JsonContent>, AccordError>;
}
