// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `accord check` command implementation.

use std::io::Write;

use accord_core::{AccordError, HealthStatus, PluginAdapter};
use accord_storage::SqliteAccountStore;

/// Run the store health check and report the result.
pub async fn run_check(
    store: &SqliteAccountStore,
    out: &mut impl Write,
) -> Result<(), AccordError> {
    let status = store.health_check().await?;
    let path = store.db()?.path().to_string();
    let line = match &status {
        HealthStatus::Healthy => format!("ok: {} {} ({path})", store.name(), store.version()),
        HealthStatus::Degraded(reason) => format!("degraded: {reason} ({path})"),
        HealthStatus::Unhealthy(reason) => {
            return Err(AccordError::Internal(format!("store unhealthy: {reason}")));
        }
    };
    writeln!(out, "{line}")
        .map_err(|e| AccordError::Internal(format!("failed to write output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_config::StorageConfig;

    #[tokio::test]
    async fn check_reports_ok_for_initialized_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("check.db").to_str().unwrap().to_string(),
            ..StorageConfig::default()
        };
        let store = SqliteAccountStore::open(config).await.unwrap();

        let mut out = Vec::new();
        run_check(&store, &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("ok: sqlite 0.1.0"), "{out}");
    }
}
