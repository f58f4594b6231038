// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembles the assistant message of a turn from its event stream.

use parlor_core::{ChatEvent, NewMessage, ToolAttachment, ToolOutcome};

/// Observes a turn's [`ChatEvent`]s and builds the message to persist.
#[derive(Debug, Default)]
pub struct TurnTranscript {
    text: String,
    tool_results: Vec<(String, ToolOutcome)>,
    finished: bool,
}

impl TurnTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::TextDelta { text } => self.text.push_str(text),
            ChatEvent::ToolResult { name, outcome, .. } => {
                self.tool_results.push((name.clone(), outcome.clone()));
            }
            ChatEvent::ToolCallRequested { .. } => {}
            ChatEvent::StreamEnd => self.finished = true,
        }
    }

    /// The text streamed so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `StreamEnd` has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn tool_calls(&self) -> usize {
        self.tool_results.len()
    }

    /// The assistant message for this turn.
    ///
    /// A tool attachment is recorded only when exactly one tool ran; with
    /// several there is no single name/output pair to store.
    pub fn into_message(self) -> NewMessage {
        let tool = match <[_; 1]>::try_from(self.tool_results) {
            Ok([(name, outcome)]) => Some(ToolAttachment {
                name,
                output: outcome.render(),
            }),
            Err(_) => None,
        };
        NewMessage::assistant(self.text, tool)
    }
}
