// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Accord account data store.

use std::time::Instant;

use thiserror::Error;

/// The error type returned by every store, writer, and table operation.
///
/// A missing record is never an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum AccordError {
    /// Configuration errors surfaced after startup (bad paths, unsupported options).
    #[error("configuration error: {0}")]
    Config(String),

    /// The storage engine failed to prepare, execute, or commit a statement,
    /// or the connection is closed. Never retried inside the store.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The caller supplied structurally invalid input. Rejected before any
    /// statement reaches the writer.
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON content could not be encoded or decoded into the requested type.
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// The request context was cancelled before the operation ran.
    #[error("operation cancelled")]
    Cancelled,

    /// The request context deadline passed before the operation ran.
    #[error("deadline exceeded ({:?} ago)", .deadline.elapsed())]
    DeadlineExceeded { deadline: Instant },

    /// Internal or unexpected errors, such as a write unit that panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccordError {
    /// Wraps any engine error as a storage fault.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// True for faults raised by the storage engine.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// True for input rejected before reaching storage.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True when the request context ended the operation.
    pub fn is_context(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }
}
