// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decodes an Anthropic Messages SSE body into [`ProviderStreamChunk`]s.
//!
//! Framing is handled by `eventsource-stream`. [`ChunkDecoder`] then turns
//! each named event into at most one chunk, holding `tool_use` blocks back
//! until their `input_json_delta` fragments are complete.

use std::collections::HashMap;

use eventsource_stream::Eventsource;
use futures::stream::StreamExt;
use parlor_core::ParlorError;
use parlor_core::traits::ProviderStream;
use parlor_core::types::{ProviderStreamChunk, StreamEventType, TokenUsage, ToolUseData};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::types::{
    ApiUsage, ResponseContentBlock, SseContentBlockDelta, SseContentBlockStart,
    SseContentBlockStop, SseDelta, SseError, SseMessageDelta, SseMessageStart,
};

/// A `tool_use` block whose input is still arriving.
#[derive(Debug)]
struct PendingToolUse {
    id: String,
    name: String,
    input_json: String,
}

impl PendingToolUse {
    fn finish(self) -> ToolUseData {
        let input = if self.input_json.trim().is_empty() {
            serde_json::json!({})
        } else {
            // Unparseable input is passed on so schema validation rejects it.
            serde_json::from_str(&self.input_json).unwrap_or_else(|e| {
                warn!(error = %e, tool = %self.name, "tool_use input is not valid JSON");
                serde_json::json!({ "_parse_error": e.to_string(), "_raw": self.input_json })
            })
        };
        ToolUseData {
            id: self.id,
            name: self.name,
            input,
        }
    }
}

/// Per-response decoding state.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    tool_uses: HashMap<usize, PendingToolUse>,
    stop_reason: Option<String>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one SSE event. `None` for events with nothing to report:
    /// pings, block starts, partial tool input, and event names this
    /// decoder does not know.
    pub fn feed(
        &mut self,
        event: &str,
        data: &str,
    ) -> Option<Result<ProviderStreamChunk, ParlorError>> {
        let chunk = match event {
            "message_start" => {
                let start: SseMessageStart = match payload(event, data) {
                    Ok(start) => start,
                    Err(e) => return Some(Err(e)),
                };
                ProviderStreamChunk {
                    usage: Some(token_usage(start.message.usage)),
                    ..ProviderStreamChunk::empty(StreamEventType::MessageStart)
                }
            }
            "content_block_start" => {
                let start: SseContentBlockStart = match payload(event, data) {
                    Ok(start) => start,
                    Err(e) => return Some(Err(e)),
                };
                if let ResponseContentBlock::ToolUse { id, name, .. } = start.content_block {
                    self.tool_uses.insert(
                        start.index,
                        PendingToolUse {
                            id,
                            name,
                            input_json: String::new(),
                        },
                    );
                }
                return None;
            }
            "content_block_delta" => {
                let delta: SseContentBlockDelta = match payload(event, data) {
                    Ok(delta) => delta,
                    Err(e) => return Some(Err(e)),
                };
                match delta.delta {
                    SseDelta::TextDelta { text } => ProviderStreamChunk::text(text),
                    SseDelta::InputJsonDelta { partial_json } => {
                        if let Some(pending) = self.tool_uses.get_mut(&delta.index) {
                            pending.input_json.push_str(&partial_json);
                        }
                        return None;
                    }
                }
            }
            "content_block_stop" => {
                let stop: SseContentBlockStop = match payload(event, data) {
                    Ok(stop) => stop,
                    Err(e) => return Some(Err(e)),
                };
                // Text blocks end silently; their content already streamed.
                let pending = self.tool_uses.remove(&stop.index)?;
                ProviderStreamChunk::tool_use(pending.finish())
            }
            "message_delta" => {
                let delta: SseMessageDelta = match payload(event, data) {
                    Ok(delta) => delta,
                    Err(e) => return Some(Err(e)),
                };
                if delta.delta.stop_reason.is_some() {
                    self.stop_reason.clone_from(&delta.delta.stop_reason);
                }
                ProviderStreamChunk {
                    usage: delta.usage.map(token_usage),
                    stop_reason: delta.delta.stop_reason,
                    ..ProviderStreamChunk::empty(StreamEventType::MessageDelta)
                }
            }
            "message_stop" => ProviderStreamChunk {
                stop_reason: self.stop_reason.clone(),
                ..ProviderStreamChunk::empty(StreamEventType::MessageStop)
            },
            "error" => {
                let error: SseError = match payload(event, data) {
                    Ok(error) => error,
                    Err(e) => return Some(Err(e)),
                };
                ProviderStreamChunk {
                    error: Some(format!("{}: {}", error.error.type_, error.error.message)),
                    ..ProviderStreamChunk::empty(StreamEventType::Error)
                }
            }
            // "ping", and event types added to the API later.
            _ => return None,
        };
        Some(Ok(chunk))
    }
}

fn payload<T: DeserializeOwned>(event: &str, data: &str) -> Result<T, ParlorError> {
    serde_json::from_str(data).map_err(|e| ParlorError::Provider {
        message: format!("failed to parse {event}: {e}"),
        source: Some(Box::new(e)),
    })
}

fn token_usage(usage: ApiUsage) -> TokenUsage {
    TokenUsage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    }
}

/// Streams the chunks of a successful streaming response.
pub fn decode(response: reqwest::Response) -> ProviderStream {
    let mut decoder = ChunkDecoder::new();
    let chunks = response.bytes_stream().eventsource().filter_map(move |item| {
        let chunk = match item {
            Ok(event) => decoder.feed(&event.event, &event.data),
            Err(e) => Some(Err(ParlorError::model_unavailable(format!(
                "SSE stream error: {e}"
            )))),
        };
        async move { chunk }
    });
    Box::pin(chunks)
}
