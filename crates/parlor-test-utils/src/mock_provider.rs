// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted rounds, one per
//! `stream()` call, enabling fast, CI-runnable tests without external API
//! calls. It records every request and counts calls so tests can assert the
//! model was never invoked.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use parlor_core::traits::adapter::PluginAdapter;
use parlor_core::traits::provider::{ProviderAdapter, ProviderStream};
use parlor_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderStreamChunk, StreamEventType, TokenUsage,
    ToolUseData,
};
use parlor_core::ParlorError;

/// One scripted provider round.
#[derive(Debug, Clone)]
pub enum MockRound {
    /// Streams the text chunks, then the tool uses, then stops.
    Reply {
        chunks: Vec<String>,
        tool_uses: Vec<ToolUseData>,
    },
    /// `stream()` itself fails, before any chunk.
    Refuse(String),
    /// Streams the text chunks, then an upstream error item.
    BreakAfter { chunks: Vec<String>, message: String },
    /// Streams the text chunks, then never produces another item.
    Stall { chunks: Vec<String> },
}

impl MockRound {
    /// A plain text reply delivered in one chunk.
    pub fn text(text: &str) -> Self {
        Self::chunks(&[text])
    }

    /// A plain text reply delivered in the given fragments.
    pub fn chunks(chunks: &[&str]) -> Self {
        Self::Reply {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            tool_uses: Vec::new(),
        }
    }

    /// A round that requests a single tool call and says nothing.
    pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> Self {
        Self::tool_calls(vec![(id, name, input)])
    }

    /// A round that requests several tool calls, in order.
    pub fn tool_calls(calls: Vec<(&str, &str, serde_json::Value)>) -> Self {
        Self::Reply {
            chunks: Vec::new(),
            tool_uses: calls
                .into_iter()
                .map(|(id, name, input)| ToolUseData {
                    id: id.to_string(),
                    name: name.to_string(),
                    input,
                })
                .collect(),
        }
    }
}

/// Increments a counter when the stream that owns it is dropped.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A mock LLM provider that plays back scripted rounds.
///
/// Rounds are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text reply is played.
pub struct MockProvider {
    rounds: Mutex<VecDeque<MockRound>>,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
    streams_dropped: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self::with_rounds(Vec::new())
    }

    /// Create a mock provider pre-loaded with the given rounds.
    pub fn with_rounds(rounds: Vec<MockRound>) -> Self {
        Self {
            rounds: Mutex::new(VecDeque::from(rounds)),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            streams_dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock provider whose single round is a text reply.
    pub fn with_text(text: &str) -> Self {
        Self::with_rounds(vec![MockRound::text(text)])
    }

    /// Number of `stream()` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of returned streams that have since been dropped.
    pub fn streams_dropped(&self) -> usize {
        self.streams_dropped.load(Ordering::SeqCst)
    }

    /// Every request received, in call order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_round(&self) -> MockRound {
        self.rounds
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockRound::text("mock response"))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn text_chunks(chunks: Vec<String>) -> Vec<Result<ProviderStreamChunk, ParlorError>> {
    chunks
        .into_iter()
        .map(|c| Ok(ProviderStreamChunk::text(c)))
        .collect()
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, ParlorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);

        let start = ProviderStreamChunk {
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 0,
            }),
            ..ProviderStreamChunk::empty(StreamEventType::MessageStart)
        };

        // MessageStart -> deltas -> tool uses -> MessageDelta -> MessageStop,
        // mirroring the Anthropic event order.
        let stream: ProviderStream = match self.next_round().await {
            MockRound::Refuse(message) => return Err(ParlorError::model_unavailable(message)),
            MockRound::Reply { chunks, tool_uses } => {
                let stop_reason = if tool_uses.is_empty() {
                    "end_turn"
                } else {
                    "tool_use"
                };
                let mut items = vec![Ok(start)];
                items.extend(text_chunks(chunks));
                items.extend(
                    tool_uses
                        .into_iter()
                        .map(|t| Ok(ProviderStreamChunk::tool_use(t))),
                );
                items.push(Ok(ProviderStreamChunk {
                    usage: Some(TokenUsage {
                        input_tokens: 10,
                        output_tokens: 20,
                    }),
                    stop_reason: Some(stop_reason.to_string()),
                    ..ProviderStreamChunk::empty(StreamEventType::MessageDelta)
                }));
                items.push(Ok(ProviderStreamChunk {
                    stop_reason: Some(stop_reason.to_string()),
                    ..ProviderStreamChunk::empty(StreamEventType::MessageStop)
                }));
                Box::pin(stream::iter(items))
            }
            MockRound::BreakAfter { chunks, message } => {
                let mut items = vec![Ok(start)];
                items.extend(text_chunks(chunks));
                items.push(Err(ParlorError::model_unavailable(message)));
                Box::pin(stream::iter(items))
            }
            MockRound::Stall { chunks } => {
                let mut items = vec![Ok(start)];
                items.extend(text_chunks(chunks));
                Box::pin(stream::iter(items).chain(stream::pending()))
            }
        };

        let guard = DropCounter(Arc::clone(&self.streams_dropped));
        Ok(Box::pin(stream.map(move |item| {
            let _ = &guard;
            item
        })))
    }
}
