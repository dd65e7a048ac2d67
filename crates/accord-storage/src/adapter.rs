// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the account data store traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use accord_config::StorageConfig;
use accord_core::{
    AccordError, AccountData, AccountDataStore, HealthStatus, JsonContent, Localpart,
    PluginAdapter, RequestContext, RoomScope, StorageAdapter,
};

use crate::database::Database;
use crate::queries::account_data;

/// SQLite-backed account data store.
///
/// Wraps a [`Database`] handle and delegates to the typed query module.
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteAccountStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteAccountStore {
    /// Create a store for the given configuration.
    ///
    /// No connection is opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize a store in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, AccordError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// The underlying database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, AccordError> {
        self.db.get().ok_or_else(|| AccordError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn validate_write(&self, data_type: &str, content: &JsonContent) -> Result<(), AccordError> {
        if data_type.trim().is_empty() {
            return Err(AccordError::Validation(
                "account data type must not be empty".to_string(),
            ));
        }
        if content.is_blank() && !self.config.allow_empty_content {
            return Err(AccordError::Validation(
                "account data content must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteAccountStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, AccordError> {
        let db = self.db()?;
        db.writer()
            .with_connection(|conn| {
                conn.execute_batch("SELECT 1;")
                    .map_err(AccordError::storage)
            })
            .await?;
        db.readers()
            .read(&RequestContext::background(), |conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            })
            .await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AccordError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteAccountStore {
    async fn initialize(&self) -> Result<(), AccordError> {
        if self.db.initialized() {
            return Err(AccordError::Storage {
                source: "storage already initialized".into(),
            });
        }
        let db = Database::open(&self.config).await?;
        self.db.set(db).map_err(|_| AccordError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite account store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), AccordError> {
        self.db()?.checkpoint().await
    }
}

#[async_trait]
impl AccountDataStore for SqliteAccountStore {
    async fn set_account_data(
        &self,
        ctx: &RequestContext,
        localpart: &Localpart,
        room: &RoomScope,
        data_type: &str,
        content: &JsonContent,
    ) -> Result<(), AccordError> {
        self.validate_write(data_type, content)?;
        account_data::upsert_account_data(self.db()?, ctx, localpart, room, data_type, content)
            .await
    }

    async fn get_account_data(
        &self,
        ctx: &RequestContext,
        localpart: &Localpart,
    ) -> Result<AccountData, AccordError> {
        account_data::select_account_data(self.db()?, ctx, localpart).await
    }

    async fn get_account_data_by_type(
        &self,
        ctx: &RequestContext,
        localpart: &Localpart,
        room: &RoomScope,
        data_type: &str,
    ) -> Result<Option<JsonContent>, AccordError> {
        account_data::select_account_data_by_type(self.db()?, ctx, localpart, room, data_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        }
    }

    fn alice() -> Localpart {
        Localpart::new("alice").unwrap()
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        let result = store.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let store = SqliteAccountStore::open(make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        let status = store.health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        let err = store.health_check().await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn empty_type_is_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("empty_type.db");
        let store = SqliteAccountStore::open(make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        let err = store
            .set_account_data(
                &RequestContext::background(),
                &alice(),
                &RoomScope::Global,
                "",
                &JsonContent::from("{}"),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.db().unwrap().writer().submitted(), 0);
    }

    #[tokio::test]
    async fn shutdown_runs_checkpoint() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let store = SqliteAccountStore::open(make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        store
            .set_account_data(
                &RequestContext::background(),
                &alice(),
                &RoomScope::Global,
                "m.push_rules",
                &JsonContent::from("{}"),
            )
            .await
            .unwrap();

        store.shutdown().await.unwrap();
    }
}
