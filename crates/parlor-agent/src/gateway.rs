// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The model gateway seam between HTTP handlers and the generation loop.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use parlor_core::{ChatEvent, ChatMessage, ParlorError};
use parlor_tools::ToolRegistry;

/// Live stream of chat events. Ends after `StreamEnd` or after an `Err` item.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, ParlorError>> + Send>>;

/// One generation request.
#[derive(Clone)]
pub struct GenerateRequest {
    /// The full conversation so far, oldest first.
    pub history: Vec<ChatMessage>,
    /// Tools the model may call. `None` disables tool use entirely.
    pub tools: Option<Arc<ToolRegistry>>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    /// A tool-less request over the given history.
    pub fn new(history: Vec<ChatMessage>) -> Self {
        Self {
            history,
            tools: None,
            system_prompt: None,
            temperature: None,
        }
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Turns a conversation into a live stream of [`ChatEvent`]s.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Starts generation.
    ///
    /// The first upstream request is made before this returns, so an
    /// unreachable model fails with [`ParlorError::ModelUnavailable`] and
    /// no events.
    async fn generate(&self, request: GenerateRequest) -> Result<EventStream, ParlorError>;
}
