// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `POST /chat`: the streaming chat proxy endpoint.
//!
//! The request is validated and the session ownership checked before the
//! model gateway is called. The first chat event is awaited before the 200
//! is committed, so an unreachable model still gets a proper error status.
//! After that, events are encoded and written as they arrive, and the turn
//! is persisted atomically once the stream ends.

use std::sync::Arc;

use axum::{
    Extension,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use parlor_agent::{EventStream, GenerateRequest, TurnTranscript};
use parlor_core::{
    CallerIdentity, ChatEvent, ChatMessage, NewMessage, ParlorError, Role, StorageAdapter,
};
use serde::Deserialize;
use tokio::time::{Instant, timeout_at};

use crate::encoder::Encoding;
use crate::error::ApiError;
use crate::server::GatewayState;

pub const INVALID_MESSAGES: &str = "Invalid messages format";

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub session_id: Option<i64>,
}

impl ChatRequest {
    /// Parses and validates a raw body. Every failure is the same 400.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let request: Self =
            serde_json::from_slice(body).map_err(|_| ApiError::bad_request(INVALID_MESSAGES))?;
        if request.messages.is_empty() {
            return Err(ApiError::bad_request(INVALID_MESSAGES));
        }
        Ok(request)
    }

    /// The user message that opened this turn, if the history ends with one.
    pub fn user_turn(&self) -> Option<NewMessage> {
        self.messages
            .last()
            .filter(|m| m.role == Role::User)
            .map(|m| NewMessage::user(m.content.clone()))
    }
}

/// POST /chat
pub async fn post_chat(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = ChatRequest::parse(&body)?;
    if let Some(session_id) = request.session_id {
        state.storage.get_session(&caller, session_id).await?;
    }

    let encoding = Encoding::negotiate(&headers, state.chat.default_encoding);
    let user_turn = request.user_turn();
    let session_id = request.session_id;

    let mut generate = GenerateRequest::new(request.messages)
        .with_system_prompt(state.chat.system_prompt.clone())
        .with_temperature(state.chat.temperature);
    if let Some(tools) = &state.tools {
        generate = generate.with_tools(Arc::clone(tools));
    }

    let deadline = Instant::now() + state.chat.request_timeout;
    let events = state.gateway.generate(generate).await.map_err(|e| {
        tracing::error!(error = %e, owner = %caller, "model gateway unavailable");
        ApiError::internal()
    })?;

    let mut turn = Turn {
        events,
        pending: None,
        transcript: TurnTranscript::new(),
        encoding,
        deadline,
        storage: Arc::clone(&state.storage),
        owner: caller,
        session_id,
        user_turn,
        settled: false,
        timeout: state.chat.request_timeout,
    };
    if let Err(e) = turn.await_output().await {
        turn.settled = true;
        tracing::error!(error = %e, owner = %turn.owner, "chat stream failed before first output");
        return Err(ApiError::internal());
    }

    tracing::debug!(owner = %turn.owner, ?session_id, ?encoding, "streaming chat response");
    let body = Body::from_stream(futures::stream::unfold(turn, Turn::next_chunk));

    Ok((
        [
            (header::CONTENT_TYPE, encoding.content_type()),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// Next event before the deadline. Expiry and early end count as upstream failures.
async fn pull(
    events: &mut EventStream,
    deadline: Instant,
    timeout: std::time::Duration,
) -> Result<ChatEvent, ParlorError> {
    match timeout_at(deadline, events.next()).await {
        Ok(Some(item)) => item,
        Ok(None) => Err(ParlorError::model_unavailable(
            "model stream ended before completion",
        )),
        Err(_) => Err(ParlorError::Timeout { duration: timeout }),
    }
}

/// One chat turn being written to the client.
struct Turn {
    events: EventStream,
    pending: Option<ChatEvent>,
    transcript: TurnTranscript,
    encoding: Encoding,
    deadline: Instant,
    timeout: std::time::Duration,
    storage: Arc<dyn StorageAdapter>,
    owner: CallerIdentity,
    session_id: Option<i64>,
    user_turn: Option<NewMessage>,
    settled: bool,
}

impl Turn {
    /// Reads ahead until an event that writes bytes, or the end of the turn.
    /// Skipped events still reach the transcript. Until this returns, no
    /// status has been sent and failures can still become a 500.
    async fn await_output(&mut self) -> Result<(), ParlorError> {
        loop {
            let event = pull(&mut self.events, self.deadline, self.timeout).await?;
            if event.is_terminal() || self.encoding.event(&event).is_some() {
                self.pending = Some(event);
                return Ok(());
            }
            self.transcript.observe(&event);
        }
    }

    /// Produces the next body chunk, or `None` once the terminal item is out.
    async fn next_chunk(mut self) -> Option<(Result<Bytes, std::io::Error>, Self)> {
        loop {
            if self.settled {
                return None;
            }

            let item = match self.pending.take() {
                Some(event) => Ok(event),
                None => pull(&mut self.events, self.deadline, self.timeout).await,
            };

            match item {
                Ok(ChatEvent::StreamEnd) => {
                    self.transcript.observe(&ChatEvent::StreamEnd);
                    let persisted = self.persist().await;
                    self.settled = true;
                    return self
                        .encoding
                        .stop(self.session_id, persisted)
                        .map(|bytes| (Ok(bytes), self));
                }
                Ok(event) => {
                    self.transcript.observe(&event);
                    if let Some(bytes) = self.encoding.event(&event) {
                        return Some((Ok(bytes), self));
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        owner = %self.owner,
                        session_id = ?self.session_id,
                        "chat stream failed mid-turn; nothing persisted"
                    );
                    self.settled = true;
                    let chunk = self.encoding.failure(&e.to_string());
                    return Some((chunk, self));
                }
            }
        }
    }

    /// Writes the user turn and the assistant reply in one transaction.
    async fn persist(&mut self) -> bool {
        let Some(session_id) = self.session_id else {
            return false;
        };
        if !self.transcript.is_finished() {
            return false;
        }

        let tools = self.transcript.tool_calls();
        let reply_len = self.transcript.text().len();
        let assistant = std::mem::take(&mut self.transcript).into_message();
        let messages: Vec<NewMessage> = self
            .user_turn
            .take()
            .into_iter()
            .chain(std::iter::once(assistant))
            .collect();

        match self
            .storage
            .append_turn(&self.owner, session_id, messages)
            .await
        {
            Ok(stored) => {
                tracing::debug!(
                    session_id,
                    messages = stored.len(),
                    tools,
                    reply_len,
                    "turn persisted"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    session_id,
                    owner = %self.owner,
                    "failed to persist completed turn; response delivered without durability"
                );
                false
            }
        }
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if !self.settled {
            tracing::info!(
                owner = %self.owner,
                session_id = ?self.session_id,
                "client disconnected mid-turn; turn discarded"
            );
        }
    }
}
