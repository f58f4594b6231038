// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlor serve` command implementation.
//!
//! Wires the SQLite storage, the Anthropic provider, the tool registry and
//! the chat agent into the HTTP gateway, then serves until SIGINT/SIGTERM.

use std::sync::Arc;

use parlor_agent::{ChatAgent, shutdown};
use parlor_anthropic::AnthropicProvider;
use parlor_config::model::ParlorConfig;
use parlor_core::{ParlorError, StorageAdapter};
use parlor_gateway::GatewayState;
use parlor_storage::SqliteStorage;
use parlor_tools::{ToolRegistry, register_builtins};
use tracing::{info, warn};

/// Runs the `parlor serve` command.
pub async fn run_serve(config: ParlorConfig) -> Result<(), ParlorError> {
    init_tracing(&config.server.log_level);

    info!("starting parlor serve");

    // Initialize storage.
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let provider = Arc::new(AnthropicProvider::new(&config.anthropic)?);
    let agent = ChatAgent::from_config(provider, &config);

    if config.auth.tokens.is_empty() {
        warn!("no auth tokens configured -- every API request will be rejected");
    }

    let mut state = GatewayState::new(Arc::new(agent), storage.clone(), &config);
    if config.tools.enabled {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, &config.tools)?;
        let names: Vec<&str> = registry.list().into_iter().map(|(name, _)| name).collect();
        info!(tools = ?names, "tools registered");
        state = state.with_tools(Arc::new(registry));
    } else {
        info!("tools disabled");
    }

    let cancel = shutdown::install_signal_handler();
    let served = parlor_gateway::start_server(&config.server, state, cancel).await;

    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close storage cleanly");
    }
    served?;

    info!("parlor serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parlor={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
