// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Parlor chat proxy.
//!
//! Serves the streaming `POST /chat` endpoint, the session REST API, and an
//! unauthenticated health check. Requests are authenticated with bearer
//! tokens mapped to user ids; chat responses are streamed either as plain
//! text or as server-sent event frames.

pub mod auth;
pub mod chat;
pub mod encoder;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use encoder::Encoding;
pub use error::ApiError;
pub use server::{ChatSettings, GatewayState, build_router, start_server};
