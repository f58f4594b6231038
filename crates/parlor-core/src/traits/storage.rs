// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait: the persistence boundary for sessions and messages.

use async_trait::async_trait;

use crate::error::ParlorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CallerIdentity, Message, NewMessage, Session};

/// Adapter for chat history persistence.
///
/// Every session-scoped operation takes the caller identity. Implementations
/// enforce ownership at a single gate and return
/// [`ParlorError::Unauthorized`] when the session does not exist or belongs
/// to another identity.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ParlorError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ParlorError>;

    /// Creates a session owned by `owner`. `None` uses the default title.
    async fn create_session(
        &self,
        owner: &CallerIdentity,
        title: Option<&str>,
    ) -> Result<Session, ParlorError>;

    /// Fetches a single session.
    async fn get_session(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
    ) -> Result<Session, ParlorError>;

    /// Lists the owner's sessions, most recently updated first.
    async fn list_sessions(&self, owner: &CallerIdentity) -> Result<Vec<Session>, ParlorError>;

    /// Renames a session and advances its `updated_at`.
    async fn rename_session(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
        title: &str,
    ) -> Result<Session, ParlorError>;

    /// Lists a session's messages in creation order.
    async fn list_messages(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
    ) -> Result<Vec<Message>, ParlorError>;

    /// Appends one message and advances the session's `updated_at`.
    async fn append_message(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
        message: NewMessage,
    ) -> Result<Message, ParlorError>;

    /// Appends several messages atomically: either all are stored or none.
    async fn append_turn(
        &self,
        owner: &CallerIdentity,
        session_id: i64,
        messages: Vec<NewMessage>,
    ) -> Result<Vec<Message>, ParlorError>;
}
