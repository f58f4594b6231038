// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use parlor_agent::ModelGateway;
use parlor_config::model::{DefaultEncoding, ParlorConfig, ServerConfig};
use parlor_core::{ParlorError, StorageAdapter};
use parlor_tools::ToolRegistry;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::{chat, handlers};

/// Per-request chat settings taken from the `chat` and `gateway` config sections.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub default_encoding: DefaultEncoding,
}

impl ChatSettings {
    pub fn from_config(config: &ParlorConfig) -> Self {
        Self {
            system_prompt: config.chat.system_prompt.clone(),
            temperature: config.chat.temperature,
            request_timeout: Duration::from_secs(config.chat.request_timeout_secs),
            default_encoding: config.gateway.default_encoding,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Produces chat event streams.
    pub gateway: Arc<dyn ModelGateway>,
    /// Session and message persistence.
    pub storage: Arc<dyn StorageAdapter>,
    /// Tools offered to the model. `None` disables tool use.
    pub tools: Option<Arc<ToolRegistry>>,
    pub chat: ChatSettings,
    pub auth: AuthConfig,
}

impl GatewayState {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        storage: Arc<dyn StorageAdapter>,
        config: &ParlorConfig,
    ) -> Self {
        Self {
            gateway,
            storage,
            tools: None,
            chat: ChatSettings::from_config(config),
            auth: AuthConfig::from_tokens(&config.auth.tokens),
        }
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Builds the gateway router.
///
/// - POST /chat, POST /v1/chat (with auth)
/// - GET/POST /v1/sessions (with auth)
/// - PATCH /v1/sessions/{id} (with auth)
/// - GET/POST /v1/sessions/{id}/messages (with auth)
/// - GET /health (no auth)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated public routes.
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    // Routes requiring authentication.
    let api_routes = Router::new()
        .route("/chat", post(chat::post_chat))
        .route("/v1/chat", post(chat::post_chat))
        .route(
            "/v1/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/v1/sessions/{id}", patch(handlers::rename_session))
        .route(
            "/v1/sessions/{id}/messages",
            get(handlers::list_messages).post(handlers::append_message),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until `shutdown` is
/// cancelled. In-flight responses are allowed to finish.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), ParlorError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParlorError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ParlorError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
