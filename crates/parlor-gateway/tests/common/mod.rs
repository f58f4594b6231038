// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for gateway endpoint tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use parlor_agent::ChatAgent;
use parlor_gateway::{GatewayState, build_router};
use parlor_test_utils::TestHarness;
use parlor_tools::ToolRegistry;

/// Router wired to the harness storage and mock provider, without tools.
pub fn app(harness: &TestHarness) -> Router {
    build_router(state(harness))
}

/// Router with the given tool registry enabled.
pub fn app_with_tools(harness: &TestHarness, tools: ToolRegistry) -> Router {
    build_router(state(harness).with_tools(Arc::new(tools)))
}

fn state(harness: &TestHarness) -> GatewayState {
    let agent = ChatAgent::from_config(harness.provider.clone(), &harness.config);
    GatewayState::new(Arc::new(agent), harness.storage.clone(), &harness.config)
}

/// A JSON request with an optional bearer token.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
    builder.body(body).unwrap()
}

/// A `POST /chat` request with the given `Accept` header.
pub fn chat_request(token: &str, accept: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut request = json_request("POST", "/chat", Some(token), Some(body));
    if let Some(accept) = accept {
        request
            .headers_mut()
            .insert(header::ACCEPT, accept.parse().unwrap());
    }
    request
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Splits an event-stream body into `(tag, data)` pairs.
pub fn frames(body: &str) -> Vec<(String, serde_json::Value)> {
    body.split("\n\n")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let (event, data) = chunk.split_once('\n').unwrap();
            let tag = event.strip_prefix("event: ").unwrap().to_string();
            let data = data.strip_prefix("data: ").unwrap();
            (tag, serde_json::from_str(data).unwrap())
        })
        .collect()
}
