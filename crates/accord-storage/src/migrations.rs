// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every open. Refinery records applied versions in
//! `refinery_schema_history`, so reopening an existing database is a no-op.

use accord_core::AccordError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AccordError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(AccordError::storage)?;
    for migration in report.applied_migrations() {
        tracing::debug!(
            version = migration.version(),
            migration = migration.name(),
            "migration applied"
        );
    }
    Ok(())
}
