// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the pieces an endpoint test needs: a config with
//! known bearer tokens, an initialized SQLite storage in a temp directory,
//! and a scripted [`MockProvider`].

use std::sync::Arc;

use parlor_config::model::{ApiTokenConfig, ParlorConfig};
use parlor_core::{ParlorError, StorageAdapter};
use parlor_storage::SqliteStorage;

use crate::mock_provider::{MockProvider, MockRound};

/// Bearer token that the default harness maps to [`ALICE`].
pub const ALICE_TOKEN: &str = "alice-token";
/// Owner id of the default harness user.
pub const ALICE: &str = "alice";
/// Bearer token that the default harness maps to [`BOB`].
pub const BOB_TOKEN: &str = "bob-token";
/// Owner id of the second harness user.
pub const BOB: &str = "bob";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    rounds: Vec<MockRound>,
    tokens: Vec<(String, String)>,
    tools_enabled: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            rounds: Vec::new(),
            tokens: vec![
                (ALICE_TOKEN.to_string(), ALICE.to_string()),
                (BOB_TOKEN.to_string(), BOB.to_string()),
            ],
            tools_enabled: false,
        }
    }

    /// Set the scripted provider rounds.
    pub fn with_rounds(mut self, rounds: Vec<MockRound>) -> Self {
        self.rounds = rounds;
        self
    }

    /// Replace the configured bearer tokens.
    pub fn with_tokens(mut self, tokens: Vec<(&str, &str)>) -> Self {
        self.tokens = tokens
            .into_iter()
            .map(|(t, u)| (t.to_string(), u.to_string()))
            .collect();
        self
    }

    /// Enable the `tools` section of the generated config.
    pub fn with_tools(mut self) -> Self {
        self.tools_enabled = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ParlorError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ParlorError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = ParlorConfig::default();
        config.storage.database_path = db_path.to_string_lossy().to_string();
        config.tools.enabled = self.tools_enabled;
        config.auth.tokens = self
            .tokens
            .into_iter()
            .map(|(token, user_id)| ApiTokenConfig { token, user_id })
            .collect();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        Ok(TestHarness {
            config,
            storage: Arc::new(storage),
            provider: Arc::new(MockProvider::with_rounds(self.rounds)),
            _temp_dir: temp_dir,
        })
    }
}

/// A fully assembled test environment.
pub struct TestHarness {
    pub config: ParlorConfig,
    pub storage: Arc<SqliteStorage>,
    pub provider: Arc<MockProvider>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start building a harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Total messages stored across the given owner's sessions.
    pub async fn message_count(&self, owner: &str) -> Result<usize, ParlorError> {
        let owner = parlor_core::CallerIdentity::new(owner);
        let mut total = 0;
        for session in self.storage.list_sessions(&owner).await? {
            total += self.storage.list_messages(&owner, session.id).await?.len();
        }
        Ok(total)
    }
}
