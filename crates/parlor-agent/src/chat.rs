// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-round tool loop over a streaming provider.
//!
//! Each round streams text deltas to the consumer as they arrive and collects
//! the tool calls the model requests. When the round stops, the calls are run
//! concurrently, their results are emitted in request order and appended to
//! the conversation, and the next round begins. The loop runs on a spawned
//! task; dropping the returned stream stops it and releases the upstream
//! response.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::future::join_all;
use parlor_config::model::ParlorConfig;
use parlor_core::types::{
    ContentBlock, ProviderMessage, ProviderRequest, StreamEventType, ToolUseData,
};
use parlor_core::{ChatEvent, ChatMessage, ParlorError, ProviderAdapter, ProviderStream};
use parlor_tools::ToolRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::gateway::{EventStream, GenerateRequest, ModelGateway};

/// Events buffered between the loop task and the consumer.
const EVENT_BUFFER: usize = 32;

/// The [`ModelGateway`] implementation backed by a [`ProviderAdapter`].
pub struct ChatAgent {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    max_tool_rounds: u32,
}

impl ChatAgent {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        model: impl Into<String>,
        max_tokens: u32,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            max_tool_rounds,
        }
    }

    /// Builds an agent using the `anthropic` and `chat` config sections.
    pub fn from_config(provider: Arc<dyn ProviderAdapter>, config: &ParlorConfig) -> Self {
        Self::new(
            provider,
            config.anthropic.default_model.clone(),
            config.anthropic.max_tokens,
            config.chat.max_tool_rounds,
        )
    }
}

/// Collapses any provider failure into `ModelUnavailable`.
fn unavailable(err: ParlorError) -> ParlorError {
    match err {
        ParlorError::ModelUnavailable { .. } => err,
        other => ParlorError::ModelUnavailable {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

fn to_provider_message(message: &ChatMessage) -> ProviderMessage {
    ProviderMessage {
        role: message.role.to_string(),
        content: vec![ContentBlock::Text {
            text: message.content.clone(),
        }],
    }
}

#[async_trait]
impl ModelGateway for ChatAgent {
    async fn generate(&self, request: GenerateRequest) -> Result<EventStream, ParlorError> {
        let tool_defs = request
            .tools
            .as_ref()
            .map(|registry| registry.tool_definitions())
            .filter(|defs| !defs.is_empty());

        let template = ProviderRequest {
            model: self.model.clone(),
            system_prompt: request.system_prompt,
            messages: Vec::new(),
            max_tokens: self.max_tokens,
            temperature: request.temperature,
            stream: true,
            tools: tool_defs,
        };
        let conversation: Vec<ProviderMessage> =
            request.history.iter().map(to_provider_message).collect();

        let first = self
            .provider
            .stream(ProviderRequest {
                messages: conversation.clone(),
                ..template.clone()
            })
            .await
            .map_err(unavailable)?;

        debug!(
            history = conversation.len(),
            tools = template.tools.as_ref().map_or(0, Vec::len),
            "generation started"
        );

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let tool_loop = ToolLoop {
            provider: Arc::clone(&self.provider),
            template,
            conversation,
            tools: request.tools,
            max_tool_rounds: self.max_tool_rounds,
            tx,
        };
        tokio::spawn(tool_loop.run(first));

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}

/// What ended a provider round.
enum RoundEnd {
    /// `message_stop` arrived; these tool calls were requested.
    Stopped(Vec<ToolUseData>, String),
    /// An error was forwarded or the consumer went away.
    Abandoned,
}

struct ToolLoop {
    provider: Arc<dyn ProviderAdapter>,
    template: ProviderRequest,
    conversation: Vec<ProviderMessage>,
    tools: Option<Arc<ToolRegistry>>,
    max_tool_rounds: u32,
    tx: mpsc::Sender<Result<ChatEvent, ParlorError>>,
}

impl ToolLoop {
    async fn run(mut self, mut upstream: ProviderStream) {
        let mut tool_rounds = 0u32;
        loop {
            let (tool_uses, text) = match self.drain_round(&mut upstream).await {
                RoundEnd::Stopped(tool_uses, text) => (tool_uses, text),
                RoundEnd::Abandoned => return,
            };
            // Release the finished response before any tool runs.
            drop(upstream);

            let registry = match (&self.tools, tool_uses.is_empty()) {
                (Some(registry), false) => Arc::clone(registry),
                (None, false) => {
                    warn!(count = tool_uses.len(), "model requested tools that were not offered");
                    self.emit(Ok(ChatEvent::StreamEnd)).await;
                    return;
                }
                (_, true) => {
                    self.emit(Ok(ChatEvent::StreamEnd)).await;
                    return;
                }
            };

            if tool_rounds >= self.max_tool_rounds {
                warn!(
                    max_tool_rounds = self.max_tool_rounds,
                    "tool round limit reached, ending turn"
                );
                self.emit(Ok(ChatEvent::StreamEnd)).await;
                return;
            }
            tool_rounds += 1;

            let calls = tool_uses
                .iter()
                .map(|call| registry.execute(&call.name, call.input.clone()));
            let outcomes = tokio::select! {
                outcomes = join_all(calls) => outcomes,
                _ = self.tx.closed() => {
                    debug!("consumer dropped during tool execution");
                    return;
                }
            };

            let mut assistant_blocks = Vec::with_capacity(tool_uses.len() + 1);
            if !text.is_empty() {
                assistant_blocks.push(ContentBlock::Text { text });
            }
            let mut result_blocks = Vec::with_capacity(tool_uses.len());

            for (call, outcome) in tool_uses.into_iter().zip(outcomes) {
                info!(tool = %call.name, failed = outcome.is_error(), "tool call completed");
                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: outcome.render(),
                    is_error: outcome.is_error(),
                });
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                });

                let requested = ChatEvent::ToolCallRequested {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.input,
                };
                let result = ChatEvent::ToolResult {
                    id: call.id,
                    name: call.name,
                    outcome,
                };
                if !self.emit(Ok(requested)).await || !self.emit(Ok(result)).await {
                    return;
                }
            }

            self.conversation.push(ProviderMessage {
                role: "assistant".into(),
                content: assistant_blocks,
            });
            self.conversation.push(ProviderMessage {
                role: "user".into(),
                content: result_blocks,
            });

            let next = ProviderRequest {
                messages: self.conversation.clone(),
                ..self.template.clone()
            };
            upstream = match self.provider.stream(next).await {
                Ok(stream) => stream,
                Err(e) => {
                    self.emit(Err(unavailable(e))).await;
                    return;
                }
            };
        }
    }

    /// Streams one round's text to the consumer and collects its tool calls.
    async fn drain_round(&self, upstream: &mut ProviderStream) -> RoundEnd {
        let mut tool_uses = Vec::new();
        let mut text = String::new();
        loop {
            let item = tokio::select! {
                item = upstream.next() => item,
                _ = self.tx.closed() => {
                    debug!("consumer dropped, abandoning generation");
                    return RoundEnd::Abandoned;
                }
            };

            let chunk = match item {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    warn!(error = %e, "upstream failed mid-stream");
                    self.emit(Err(unavailable(e))).await;
                    return RoundEnd::Abandoned;
                }
                None => {
                    warn!("upstream ended without message_stop");
                    self.emit(Err(ParlorError::model_unavailable(
                        "model stream ended unexpectedly",
                    )))
                    .await;
                    return RoundEnd::Abandoned;
                }
            };

            match chunk.event_type {
                StreamEventType::ContentBlockDelta => {
                    if let Some(delta) = chunk.text.filter(|t| !t.is_empty()) {
                        text.push_str(&delta);
                        if !self.emit(Ok(ChatEvent::text(delta))).await {
                            return RoundEnd::Abandoned;
                        }
                    }
                }
                StreamEventType::ContentBlockStop => {
                    if let Some(tool_use) = chunk.tool_use {
                        tool_uses.push(tool_use);
                    }
                }
                StreamEventType::MessageStop => return RoundEnd::Stopped(tool_uses, text),
                StreamEventType::Error => {
                    let message = chunk
                        .error
                        .unwrap_or_else(|| "model reported an error".to_string());
                    warn!(error = %message, "upstream error event");
                    self.emit(Err(ParlorError::model_unavailable(message))).await;
                    return RoundEnd::Abandoned;
                }
                StreamEventType::MessageStart | StreamEventType::MessageDelta => {}
            }
        }
    }

    /// Sends an event; `false` once the consumer has gone away.
    async fn emit(&self, item: Result<ChatEvent, ParlorError>) -> bool {
        self.tx.send(item).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parlor_core::ToolOutcome;
    use parlor_test_utils::{MockProvider, MockRound};
    use parlor_tools::Tool;

    struct FixedTool {
        name: &'static str,
        result: Result<serde_json::Value, String>,
    }

    #[async_trait]
    impl Tool for FixedTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "returns a fixed result"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object" })
        }

        async fn invoke(&self, _input: serde_json::Value) -> Result<serde_json::Value, ParlorError> {
            self.result
                .clone()
                .map_err(|message| ParlorError::tool_failed(self.name, message))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "getWeather",
                result: Ok(serde_json::json!({ "temperature": 12 })),
            }))
            .unwrap();
        registry
            .register(Arc::new(FixedTool {
                name: "getStockPrice",
                result: Err("Symbol ZZZZINVALID not found".into()),
            }))
            .unwrap();
        Arc::new(registry)
    }

    fn agent(provider: Arc<MockProvider>) -> ChatAgent {
        ChatAgent::new(provider, "mock-model", 1024, 5)
    }

    async fn collect(stream: EventStream) -> Vec<Result<ChatEvent, ParlorError>> {
        stream.collect().await
    }

    fn request(text: &str) -> GenerateRequest {
        GenerateRequest::new(vec![ChatMessage::user(text)])
    }

    #[tokio::test]
    async fn plain_reply_streams_text_then_ends() {
        let provider = Arc::new(MockProvider::with_rounds(vec![MockRound::chunks(&[
            "Hello", ", ", "world",
        ])]));
        let events = collect(agent(provider.clone()).generate(request("hi")).await.unwrap()).await;

        let events: Vec<ChatEvent> = events.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![
                ChatEvent::text("Hello"),
                ChatEvent::text(", "),
                ChatEvent::text("world"),
                ChatEvent::StreamEnd,
            ]
        );
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn request_carries_prompt_temperature_and_history() {
        let provider = Arc::new(MockProvider::with_text("ok"));
        let req = GenerateRequest::new(vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ])
        .with_system_prompt("Be brief.")
        .with_temperature(0.2);
        collect(agent(provider.clone()).generate(req).await.unwrap()).await;

        let sent = &provider.requests().await[0];
        assert_eq!(sent.model, "mock-model");
        assert_eq!(sent.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(sent.temperature, Some(0.2));
        assert!(sent.stream);
        assert!(sent.tools.is_none());
        let roles: Vec<&str> = sent.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn refused_first_request_fails_before_any_event() {
        let provider = Arc::new(MockProvider::with_rounds(vec![MockRound::Refuse(
            "connection refused".into(),
        )]));
        let result = agent(provider).generate(request("hi")).await;
        assert!(matches!(result, Err(ParlorError::ModelUnavailable { .. })));
    }

    #[tokio::test]
    async fn tool_round_emits_call_then_result_then_continues() {
        let provider = Arc::new(MockProvider::with_rounds(vec![
            MockRound::tool_call("t1", "getWeather", serde_json::json!({ "location": "London" })),
            MockRound::text("It is 12°C in London."),
        ]));
        let req = request("Weather in London?").with_tools(registry());
        let events: Vec<ChatEvent> = collect(agent(provider.clone()).generate(req).await.unwrap())
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            ChatEvent::ToolCallRequested { id, name, .. } if id == "t1" && name == "getWeather"
        ));
        assert!(matches!(
            &events[1],
            ChatEvent::ToolResult { id, outcome: ToolOutcome::Success(_), .. } if id == "t1"
        ));
        assert_eq!(events[2], ChatEvent::text("It is 12°C in London."));
        assert_eq!(events[3], ChatEvent::StreamEnd);

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(2));
        let follow_up = &requests[1].messages;
        assert_eq!(follow_up.len(), 3);
        assert!(matches!(&follow_up[1].content[0], ContentBlock::ToolUse { name, .. } if name == "getWeather"));
        assert!(matches!(
            &follow_up[2].content[0],
            ContentBlock::ToolResult { tool_use_id, is_error: false, .. } if tool_use_id == "t1"
        ));
    }

    #[tokio::test]
    async fn tool_failure_is_reported_and_turn_completes() {
        let provider = Arc::new(MockProvider::with_rounds(vec![
            MockRound::tool_call("t1", "getStockPrice", serde_json::json!({ "symbol": "ZZZZINVALID" })),
            MockRound::text("I couldn't find that symbol."),
        ]));
        let req = request("Price of ZZZZINVALID?").with_tools(registry());
        let events: Vec<ChatEvent> = collect(agent(provider.clone()).generate(req).await.unwrap())
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        match &events[1] {
            ChatEvent::ToolResult {
                outcome: ToolOutcome::Failure(message),
                ..
            } => assert!(message.contains("not found")),
            other => panic!("expected failed tool result, got {other:?}"),
        }
        assert_eq!(events.last(), Some(&ChatEvent::StreamEnd));

        let requests = provider.requests().await;
        assert!(matches!(
            &requests[1].messages[2].content[0],
            ContentBlock::ToolResult { is_error: true, .. }
        ));
    }

    #[tokio::test]
    async fn parallel_calls_are_emitted_in_request_order() {
        let provider = Arc::new(MockProvider::with_rounds(vec![
            MockRound::tool_calls(vec![
                ("a", "getStockPrice", serde_json::json!({})),
                ("b", "getWeather", serde_json::json!({})),
            ]),
            MockRound::text("done"),
        ]));
        let req = request("both").with_tools(registry());
        let ids: Vec<String> = collect(agent(provider).generate(req).await.unwrap())
            .await
            .into_iter()
            .filter_map(|e| match e.unwrap() {
                ChatEvent::ToolCallRequested { id, .. } => Some(format!("call:{id}")),
                ChatEvent::ToolResult { id, .. } => Some(format!("result:{id}")),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["call:a", "result:a", "call:b", "result:b"]);
    }

    #[tokio::test]
    async fn round_cap_ends_the_turn() {
        let looping: Vec<MockRound> = (0..4)
            .map(|i| MockRound::tool_call(&format!("t{i}"), "getWeather", serde_json::json!({})))
            .collect();
        let provider = Arc::new(MockProvider::with_rounds(looping));
        let agent = ChatAgent::new(provider.clone(), "mock-model", 1024, 2);

        let events: Vec<ChatEvent> = collect(
            agent
                .generate(request("loop").with_tools(registry()))
                .await
                .unwrap(),
        )
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

        let results = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::ToolResult { .. }))
            .count();
        assert_eq!(results, 2);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(events.last(), Some(&ChatEvent::StreamEnd));
    }

    #[tokio::test]
    async fn mid_stream_failure_ends_with_error_item() {
        let provider = Arc::new(MockProvider::with_rounds(vec![MockRound::BreakAfter {
            chunks: vec!["Partial".into()],
            message: "connection reset".into(),
        }]));
        let events = collect(agent(provider).generate(request("hi")).await.unwrap()).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), &ChatEvent::text("Partial"));
        assert!(matches!(events[1], Err(ParlorError::ModelUnavailable { .. })));
    }

    #[tokio::test]
    async fn tools_requested_without_registry_end_the_turn() {
        let provider = Arc::new(MockProvider::with_rounds(vec![MockRound::tool_call(
            "t1",
            "getWeather",
            serde_json::json!({}),
        )]));
        let events = collect(agent(provider.clone()).generate(request("hi")).await.unwrap()).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &ChatEvent::StreamEnd);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_upstream() {
        let provider = Arc::new(MockProvider::with_rounds(vec![MockRound::Stall {
            chunks: vec!["Hello".into()],
        }]));
        let mut stream = agent(provider.clone()).generate(request("hi")).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), ChatEvent::text("Hello"));

        drop(stream);
        for _ in 0..50 {
            if provider.streams_dropped() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(provider.streams_dropped(), 1);
    }
}
