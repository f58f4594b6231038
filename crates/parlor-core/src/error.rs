// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parlor chat proxy.

use thiserror::Error;

/// The primary error type used across all Parlor adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParlorError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Provider protocol errors that are not availability failures
    /// (unparseable responses, unexpected payloads).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The hosted model endpoint is unreachable or rejected the request.
    #[error("model unavailable: {message}")]
    ModelUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing or invalid caller identity, or access to a session owned by someone else.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed or missing request fields.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Tool arguments did not match the tool's parameter schema.
    #[error("invalid input for tool {tool}: {message}")]
    ToolInputInvalid { tool: String, message: String },

    /// A tool executor failed (upstream error, missing key, nothing found).
    #[error("{message}")]
    ToolExecutionFailed { tool: String, message: String },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParlorError {
    /// Shorthand for a [`ParlorError::ModelUnavailable`] without an underlying source.
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`ParlorError::ToolExecutionFailed`].
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecutionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::BadRequest(_))
    }
}
