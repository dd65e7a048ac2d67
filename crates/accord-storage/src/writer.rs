// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer execution of write transactions.
//!
//! SQLite allows one writer at a time; overlapping write transactions from
//! several connections fail with `SQLITE_BUSY`. [`SerializedWriter`] owns
//! the only read-write connection. `tokio-rusqlite` runs every closure sent
//! to that connection on one background thread, draining a FIFO channel,
//! and answers each caller on its own oneshot channel. So units of work
//! execute one at a time, in submission order, and every caller receives
//! exactly its own unit's result.
//!
//! **Do NOT open additional connections for writes.** Reads go through
//! [`crate::database::ReaderPool`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use accord_core::{AccordError, RequestContext};
use rusqlite::{Transaction, TransactionBehavior};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct WriterStats {
    submitted: AtomicU64,
    completed: AtomicU64,
}

/// Handle to the single write connection.
///
/// Clones share the same connection and background thread.
#[derive(Debug, Clone)]
pub struct SerializedWriter {
    conn: tokio_rusqlite::Connection,
    stats: Arc<WriterStats>,
}

impl SerializedWriter {
    /// Take ownership of the database's write connection.
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self {
            conn,
            stats: Arc::new(WriterStats::default()),
        }
    }

    /// Run `work` inside a transaction on the write connection.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back when
    /// it returns `Err` or panics. A panic becomes [`AccordError::Internal`]
    /// for this caller only; later submissions are unaffected.
    ///
    /// If `ctx` is done by the time the unit reaches the front of the queue,
    /// the unit is skipped and the context error returned.
    pub async fn submit<F, R>(&self, ctx: &RequestContext, work: F) -> Result<R, AccordError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R, AccordError> + Send + 'static,
        R: Send + 'static,
    {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let seq = self.stats.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        let submitted_at = Instant::now();
        let stats = Arc::clone(&self.stats);
        let ctx = ctx.clone();

        let result = self
            .conn
            .call(move |conn| {
                let result = run_unit(conn, &ctx, work);
                stats.completed.fetch_add(1, Ordering::SeqCst);
                result
            })
            .await;
        let result = flatten(result);

        match &result {
            Ok(_) => debug!(seq, elapsed = ?submitted_at.elapsed(), "write unit committed"),
            Err(err) => warn!(seq, error = %err, "write unit failed"),
        }
        result
    }

    /// Run `f` on the write connection outside any transaction.
    ///
    /// Still serialized with [`SerializedWriter::submit`]. Used for PRAGMAs,
    /// migrations, and WAL checkpoints, which cannot run inside a transaction.
    pub async fn with_connection<F, R>(&self, f: F) -> Result<R, AccordError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, AccordError> + Send + 'static,
        R: Send + 'static,
    {
        flatten(self.conn.call(f).await)
    }

    /// Units handed to the writer so far.
    pub fn submitted(&self) -> u64 {
        self.stats.submitted.load(Ordering::SeqCst)
    }

    /// Units that finished executing (committed, rolled back, or skipped).
    pub fn completed(&self) -> u64 {
        self.stats.completed.load(Ordering::SeqCst)
    }

    /// Close the write connection once queued units have drained.
    pub async fn close(self) -> Result<(), AccordError> {
        self.conn.close().await.map_err(AccordError::storage)
    }
}

fn run_unit<F, R>(
    conn: &mut rusqlite::Connection,
    ctx: &RequestContext,
    work: F,
) -> Result<R, AccordError>
where
    F: FnOnce(&Transaction<'_>) -> Result<R, AccordError>,
{
    if let Some(err) = ctx.err() {
        return Err(err);
    }

    // IMMEDIATE takes the write lock up front instead of on the first write.
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(AccordError::storage)?;

    match panic::catch_unwind(AssertUnwindSafe(|| work(&tx))) {
        Ok(Ok(value)) => {
            tx.commit().map_err(AccordError::storage)?;
            Ok(value)
        }
        Ok(Err(err)) => {
            rollback(tx);
            Err(err)
        }
        Err(payload) => {
            rollback(tx);
            Err(AccordError::Internal(format!(
                "write unit panicked: {}",
                panic_message(payload.as_ref())
            )))
        }
    }
}

fn rollback(tx: Transaction<'_>) {
    if let Err(err) = tx.rollback() {
        warn!(error = %err, "rollback failed");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

fn flatten<R>(result: Result<R, tokio_rusqlite::Error<AccordError>>) -> Result<R, AccordError> {
    match result {
        Ok(value) => Ok(value),
        Err(tokio_rusqlite::Error::Error(err)) => Err(err),
        Err(other) => Err(AccordError::Storage {
            source: other.to_string().into(),
        }),
    }
}
