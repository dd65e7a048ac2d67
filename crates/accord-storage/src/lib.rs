// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Accord account data.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! serialized writer running on a dedicated `tokio-rusqlite` thread, a pool
//! of read-only connections, and the [`SqliteAccountStore`] facade that
//! implements the `accord-core` storage traits.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod writer;

pub use adapter::SqliteAccountStore;
pub use database::{Database, ReaderPool};
pub use models::*;
pub use writer::SerializedWriter;
