// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the session REST API and health check.
//!
//! Handles GET/POST /v1/sessions, PATCH /v1/sessions/{id},
//! GET/POST /v1/sessions/{id}/messages and GET /health.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parlor_core::{CallerIdentity, HealthStatus, Message, NewMessage, Role, Session, ToolAttachment};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for POST /v1/sessions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for PATCH /v1/sessions/{id}.
#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub title: String,
}

/// Request body for POST /v1/sessions/{id}/messages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageRequest {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_output: Option<String>,
}

impl AppendMessageRequest {
    /// Converts to a storable message; tool name and output travel together.
    pub fn into_message(self) -> Result<NewMessage, ApiError> {
        let tool = match (self.tool_name, self.tool_output) {
            (Some(name), Some(output)) => Some(ToolAttachment { name, output }),
            (None, None) => None,
            _ => {
                return Err(ApiError::bad_request(
                    "toolName and toolOutput must be provided together",
                ));
            }
        };
        Ok(NewMessage {
            role: self.role,
            content: self.content,
            tool,
        })
    }
}

/// Response body for GET /v1/sessions.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

/// Response body for GET /v1/sessions/{id}/messages.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded".
    pub status: String,
    /// Storage adapter status.
    pub storage: String,
}

fn parse_body<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid {what}: {e}")))
}

fn session_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid session id"))
}

/// GET /v1/sessions
pub async fn list_sessions(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.storage.list_sessions(&caller).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// POST /v1/sessions
///
/// The body is optional; without a title the session is called "New Chat".
pub async fn create_session(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CreateSessionRequest = if body.is_empty() {
        CreateSessionRequest::default()
    } else {
        parse_body(&body, "session")?
    };
    let title = request.title.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let session = state.storage.create_session(&caller, title).await?;
    tracing::debug!(owner = %caller, session_id = session.id, "session created");
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

/// PATCH /v1/sessions/{id}
pub async fn rename_session(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    path: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<Session>, ApiError> {
    let id = session_id(path)?;
    let request: RenameSessionRequest = parse_body(&body, "session")?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let session = state.storage.rename_session(&caller, id, title).await?;
    Ok(Json(session))
}

/// GET /v1/sessions/{id}/messages
pub async fn list_messages(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let id = session_id(path)?;
    let messages = state.storage.list_messages(&caller, id).await?;
    Ok(Json(MessageListResponse { messages }))
}

/// POST /v1/sessions/{id}/messages
pub async fn append_message(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    path: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id = session_id(path)?;
    let request: AppendMessageRequest = parse_body(&body, "message")?;
    let message = state
        .storage
        .append_message(&caller, id, request.into_message()?)
        .await?;
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

/// GET /health
///
/// Unauthenticated. Reports 503 when storage is not healthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (code, status, storage) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => {
            (StatusCode::OK, "degraded", format!("degraded: {reason}"))
        }
        Ok(HealthStatus::Unhealthy(reason)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "degraded",
            format!("unhealthy: {reason}"),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "storage health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "degraded",
                "unhealthy".to_string(),
            )
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            storage,
        }),
    )
        .into_response()
}
