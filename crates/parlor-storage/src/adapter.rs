// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use parlor_config::model::StorageConfig;
use parlor_core::types::{CallerIdentity, Message, NewMessage, Session};
use parlor_core::{AdapterType, HealthStatus, ParlorError, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ParlorError> {
        self.db.get().ok_or_else(|| ParlorError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

/// The ownership gate. Owner-scoped queries return `None` for sessions that
/// are missing or belong to someone else; both become `Unauthorized`.
fn require_owned<T>(
    owner: &CallerIdentity,
    session_id: i64,
    found: Option<T>,
) -> Result<T, ParlorError> {
    found.ok_or_else(|| {
        warn!(owner = %owner, session_id, "session access denied");
        ParlorError::Unauthorized("Session does not belong to user".into())
    })
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ParlorError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ParlorError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ParlorError> {
        self.db()?.close().await
    }

    async fn create_session(
        &self,
        owner: &CallerIdentity,
        title: Option<&str>,
    ) -> Result<Session, ParlorError> {
        let session = queries::sessions::create_session(self.db()?, owner.as_str(), title).await?;
        debug!(owner = %owner, session_id = session.id, "session created");
        Ok(session)
    }

    async fn get_session(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
    ) -> Result<Session, ParlorError> {
        let found = queries::sessions::get_session(self.db()?, owner.as_str(), session_id).await?;
        require_owned(owner, session_id, found)
    }

    async fn list_sessions(&self, owner: &CallerIdentity) -> Result<Vec<Session>, ParlorError> {
        queries::sessions::list_sessions(self.db()?, owner.as_str()).await
    }

    async fn rename_session(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
        title: &str,
    ) -> Result<Session, ParlorError> {
        let found =
            queries::sessions::rename_session(self.db()?, owner.as_str(), session_id, title)
                .await?;
        require_owned(owner, session_id, found)
    }

    async fn list_messages(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
    ) -> Result<Vec<Message>, ParlorError> {
        let found =
            queries::messages::list_messages(self.db()?, owner.as_str(), session_id).await?;
        require_owned(owner, session_id, found)
    }

    async fn append_message(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
        message: NewMessage,
    ) -> Result<Message, ParlorError> {
        let mut stored = self.append_turn(owner, session_id, vec![message]).await?;
        stored.pop().ok_or_else(|| {
            ParlorError::Internal("insert returned no message".into())
        })
    }

    async fn append_turn(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
        messages: Vec<NewMessage>,
    ) -> Result<Vec<Message>, ParlorError> {
        let count = messages.len();
        let found =
            queries::messages::append_messages(self.db()?, owner.as_str(), session_id, messages)
                .await?;
        let stored = require_owned(owner, session_id, found)?;
        debug!(owner = %owner, session_id, count, "messages appended");
        Ok(stored)
    }
}
