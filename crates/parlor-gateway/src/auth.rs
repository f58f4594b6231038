// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer token authentication for the gateway.
//!
//! Each configured token maps to one user id. A request carrying a known
//! token (`Authorization: Bearer <token>`) gets a [`CallerIdentity`]
//! request extension; everything else is rejected with 401.
//!
//! When no tokens are configured, all requests are rejected (fail-closed).

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use parlor_config::model::ApiTokenConfig;
use parlor_core::CallerIdentity;

use crate::error::ApiError;

/// Token to identity table shared by all requests.
#[derive(Clone, Default)]
pub struct AuthConfig {
    tokens: Arc<HashMap<String, CallerIdentity>>,
}

impl AuthConfig {
    pub fn from_tokens(tokens: &[ApiTokenConfig]) -> Self {
        let tokens = tokens
            .iter()
            .map(|t| (t.token.clone(), CallerIdentity::new(t.user_id.clone())))
            .collect();
        Self {
            tokens: Arc::new(tokens),
        }
    }

    /// Resolves an `Authorization` header value to its owner.
    pub fn resolve(&self, header: &str) -> Option<&CallerIdentity> {
        let token = header.strip_prefix("Bearer ")?.trim();
        self.tokens.get(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut users: Vec<&str> = self.tokens.values().map(CallerIdentity::as_str).collect();
        users.sort_unstable();
        f.debug_struct("AuthConfig")
            .field("tokens", &"[redacted]")
            .field("users", &users)
            .finish()
    }
}

/// Middleware that resolves the caller identity from a bearer token.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth.is_empty() {
        tracing::error!("gateway has no auth tokens configured -- rejecting request");
        return Err(ApiError::unauthorized());
    }

    let identity = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| auth.resolve(v))
        .cloned();

    match identity {
        Some(identity) => {
            tracing::trace!(owner = %identity, path = %request.uri().path(), "authenticated");
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "missing or unknown bearer token");
            Err(ApiError::unauthorized())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::from_tokens(&[
            ApiTokenConfig {
                token: "secret-token".into(),
                user_id: "alice".into(),
            },
            ApiTokenConfig {
                token: "other-token".into(),
                user_id: "bob".into(),
            },
        ])
    }

    #[test]
    fn resolves_known_bearer_token() {
        let auth = config();
        assert_eq!(
            auth.resolve("Bearer secret-token"),
            Some(&CallerIdentity::new("alice"))
        );
        assert_eq!(
            auth.resolve("Bearer other-token"),
            Some(&CallerIdentity::new("bob"))
        );
    }

    #[test]
    fn rejects_unknown_or_malformed_headers() {
        let auth = config();
        assert!(auth.resolve("Bearer nope").is_none());
        assert!(auth.resolve("secret-token").is_none());
        assert!(auth.resolve("Basic secret-token").is_none());
        assert!(auth.resolve("Bearer ").is_none());
    }

    #[test]
    fn empty_config_has_no_identities() {
        let auth = AuthConfig::from_tokens(&[]);
        assert!(auth.is_empty());
        assert!(auth.resolve("Bearer anything").is_none());
    }

    #[test]
    fn debug_redacts_tokens() {
        let debug_output = format!("{:?}", config());
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
        assert!(debug_output.contains("alice"));
    }
}
