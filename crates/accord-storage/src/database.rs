// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, WAL mode, migrations,
//! the single writer, and a pool of read-only connections.
//!
//! All writes are serialized through [`SerializedWriter`]. Readers open
//! their own read-only connections and never wait on the writer queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use accord_config::StorageConfig;
use accord_core::{AccordError, RequestContext};
use rusqlite::OpenFlags;
use tracing::{debug, info};

use crate::migrations;
use crate::writer::SerializedWriter;

/// Convert a tokio-rusqlite error into AccordError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AccordError {
    AccordError::Storage {
        source: Box::new(e),
    }
}

/// Read-only connections handed out round-robin.
#[derive(Debug)]
pub struct ReaderPool {
    conns: Vec<tokio_rusqlite::Connection>,
    next: AtomicUsize,
}

impl ReaderPool {
    async fn open(path: &str, size: usize, busy_timeout: Duration) -> Result<Self, AccordError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let mut conns = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = tokio_rusqlite::Connection::open_with_flags(path, flags)
                .await
                .map_err(AccordError::storage)?;
            conn.call(move |conn| conn.busy_timeout(busy_timeout))
                .await
                .map_err(map_tr_err)?;
            conns.push(conn);
        }
        Ok(Self {
            conns,
            next: AtomicUsize::new(0),
        })
    }

    /// Run a read on the next connection in the pool.
    ///
    /// Returns the context error as soon as `ctx` is done, without waiting
    /// for the statement to finish.
    pub async fn read<F, R>(&self, ctx: &RequestContext, f: F) -> Result<R, AccordError>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        let conn = &self.conns[idx];
        tokio::select! {
            result = conn.call(move |conn| f(conn)) => result.map_err(map_tr_err),
            err = ctx.done() => Err(err),
        }
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    async fn close(self) -> Result<(), AccordError> {
        for conn in self.conns {
            conn.close().await.map_err(AccordError::storage)?;
        }
        Ok(())
    }
}

/// An open account data database.
#[derive(Debug)]
pub struct Database {
    path: String,
    writer: SerializedWriter,
    readers: ReaderPool,
}

impl Database {
    /// Open (creating if needed) the database described by `config`.
    ///
    /// Applies PRAGMAs and pending migrations on the write connection before
    /// any reader is opened.
    pub async fn open(config: &StorageConfig) -> Result<Self, AccordError> {
        let path = config.database_path.clone();
        if path.is_empty() || path == ":memory:" || path.starts_with("file::memory:") {
            return Err(AccordError::Config(format!(
                "database path `{path}` must name a file shared by writer and readers"
            )));
        }
        if config.read_connections == 0 {
            return Err(AccordError::Config(
                "at least one read connection is required".to_string(),
            ));
        }

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let wal_mode = config.wal_mode;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(AccordError::storage)?;
        let writer = SerializedWriter::new(conn);
        let journal_mode = writer
            .with_connection(move |conn| {
                let mode =
                    apply_pragmas(conn, wal_mode, busy_timeout).map_err(AccordError::storage)?;
                migrations::run_migrations(conn)?;
                Ok(mode)
            })
            .await?;

        let readers = ReaderPool::open(&path, config.read_connections, busy_timeout).await?;

        info!(
            path = %path,
            journal_mode = %journal_mode,
            readers = readers.len(),
            "database opened"
        );
        Ok(Self {
            path,
            writer,
            readers,
        })
    }

    /// Open a database at `path` with default storage settings.
    pub async fn open_path(path: &str) -> Result<Self, AccordError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open(&config).await
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The single writer. All writes go through it.
    pub fn writer(&self) -> &SerializedWriter {
        &self.writer
    }

    pub fn readers(&self) -> &ReaderPool {
        &self.readers
    }

    /// Truncate the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), AccordError> {
        self.writer
            .with_connection(|conn| {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
                    .map_err(AccordError::storage)
            })
            .await?;
        debug!(path = %self.path, "WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoint, then close the writer and every reader.
    pub async fn close(self) -> Result<(), AccordError> {
        self.checkpoint().await?;
        self.readers.close().await?;
        self.writer.close().await?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Returns the resulting journal mode.
fn apply_pragmas(
    conn: &rusqlite::Connection,
    wal_mode: bool,
    busy_timeout: Duration,
) -> rusqlite::Result<String> {
    conn.busy_timeout(busy_timeout)?;
    let requested = if wal_mode { "WAL" } else { "DELETE" };
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", requested, |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_in_wal_mode() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open_path(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists(), "database file should be created");

        let mode: String = db
            .readers()
            .read(&RequestContext::background(), |conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_keeps_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        Database::open_path(path).await.unwrap().close().await.unwrap();
        let db = Database::open_path(path).await.unwrap();
        let tables: i64 = db
            .readers()
            .read(&RequestContext::background(), |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE name = 'account_data'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn memory_path_is_rejected() {
        let err = Database::open_path(":memory:").await.unwrap_err();
        assert!(matches!(err, AccordError::Config(_)));
    }

    #[tokio::test]
    async fn readers_cannot_write() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("readonly.db");
        let db = Database::open_path(db_path.to_str().unwrap()).await.unwrap();

        let result = db
            .readers()
            .read(&RequestContext::background(), |conn| {
                conn.execute(
                    "INSERT INTO account_data (localpart, type, content) VALUES ('a', 't', '{}')",
                    [],
                )
            })
            .await;
        assert!(result.unwrap_err().is_storage());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reader_pool_has_configured_size() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("pool.db").to_str().unwrap().to_string(),
            read_connections: 2,
            ..StorageConfig::default()
        };
        let db = Database::open(&config).await.unwrap();
        assert_eq!(db.readers().len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_read_returns_immediately() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("cancel.db");
        let db = Database::open_path(db_path.to_str().unwrap()).await.unwrap();

        let ctx = RequestContext::background();
        ctx.cancel();
        let err = db
            .readers()
            .read(&ctx, |conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AccordError::Cancelled));
        db.close().await.unwrap();
    }
}
