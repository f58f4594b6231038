// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming response encoding for `POST /chat`.
//!
//! Two wire formats are supported:
//!
//! - **Plain text** (`text/plain; charset=utf-8`): only the text deltas,
//!   concatenated. A failure aborts the connection.
//! - **Event framed** (`text/event-stream`): one server-sent event per chat
//!   event, ending with exactly one `message_stop` or `error` frame.
//!
//! ```text
//! event: text_delta
//! data: {"text":"It is 12°C"}
//!
//! event: tool_call
//! data: {"id":"toolu_1","name":"getWeather","arguments":{"location":"London"}}
//!
//! event: tool_result
//! data: {"id":"toolu_1","name":"getWeather","result":{...}}
//!
//! event: message_stop
//! data: {"session_id":42,"persisted":true}
//! ```

use axum::body::Bytes;
use axum::http::{HeaderMap, header};
use parlor_config::model::DefaultEncoding;
use parlor_core::{ChatEvent, ToolOutcome};
use serde_json::json;

pub const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Wire format of a chat response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    PlainText,
    EventFramed,
}

impl Encoding {
    /// Picks the format from the `Accept` header, falling back to the
    /// configured default when the client expresses no preference.
    pub fn negotiate(headers: &HeaderMap, default: DefaultEncoding) -> Self {
        let accept = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if accept.contains(EVENT_STREAM_CONTENT_TYPE) {
            Self::EventFramed
        } else if accept.contains("text/plain") {
            Self::PlainText
        } else {
            match default {
                DefaultEncoding::Framed => Self::EventFramed,
                DefaultEncoding::Plain => Self::PlainText,
            }
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::PlainText => PLAIN_CONTENT_TYPE,
            Self::EventFramed => EVENT_STREAM_CONTENT_TYPE,
        }
    }

    /// Encodes one chat event, or `None` when this format does not carry it.
    ///
    /// `StreamEnd` is never encoded here: the terminal frame needs the
    /// persistence result, see [`Encoding::stop`].
    pub fn event(self, event: &ChatEvent) -> Option<Bytes> {
        match (self, event) {
            (_, ChatEvent::StreamEnd) => None,
            (Self::PlainText, ChatEvent::TextDelta { text }) => {
                Some(Bytes::copy_from_slice(text.as_bytes()))
            }
            (Self::PlainText, _) => None,
            (Self::EventFramed, ChatEvent::TextDelta { text }) => {
                Some(frame("text_delta", &json!({ "text": text })))
            }
            (Self::EventFramed, ChatEvent::ToolCallRequested { id, name, arguments }) => Some(
                frame("tool_call", &json!({ "id": id, "name": name, "arguments": arguments })),
            ),
            (Self::EventFramed, ChatEvent::ToolResult { id, name, outcome }) => {
                let data = match outcome {
                    ToolOutcome::Success(value) => {
                        json!({ "id": id, "name": name, "result": value })
                    }
                    ToolOutcome::Failure(message) => {
                        json!({ "id": id, "name": name, "error": message })
                    }
                };
                Some(frame("tool_result", &data))
            }
        }
    }

    /// Terminal frame of a completed turn.
    pub fn stop(self, session_id: Option<i64>, persisted: bool) -> Option<Bytes> {
        match self {
            Self::PlainText => None,
            Self::EventFramed => Some(frame(
                "message_stop",
                &json!({ "session_id": session_id, "persisted": persisted }),
            )),
        }
    }

    /// Terminal item of a failed turn.
    ///
    /// Framed bodies end with an `error` frame. Plain bodies have no way to
    /// signal failure in-band, so the item is an I/O error and the server
    /// aborts the connection instead of ending the body cleanly.
    pub fn failure(self, message: &str) -> Result<Bytes, std::io::Error> {
        match self {
            Self::PlainText => Err(std::io::Error::other(message.to_string())),
            Self::EventFramed => Ok(frame("error", &json!({ "error": message }))),
        }
    }
}

/// One server-sent event: `event: <tag>\ndata: <json>\n\n`.
pub fn frame(tag: &str, data: &serde_json::Value) -> Bytes {
    Bytes::from(format!("event: {tag}\ndata: {data}\n\n"))
}
