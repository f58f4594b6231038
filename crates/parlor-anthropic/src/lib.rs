// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for the Parlor chat proxy.
//!
//! [`AnthropicProvider`] implements [`ProviderAdapter`] over the streaming
//! Messages API: [`client`] opens the request and [`sse`] decodes the body,
//! surfacing each tool call as one chunk once its input is complete.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use parlor_config::model::AnthropicConfig;
use parlor_core::error::ParlorError;
use parlor_core::traits::{PluginAdapter, ProviderAdapter, ProviderStream};
use parlor_core::types::{AdapterType, ContentBlock, HealthStatus, ProviderRequest};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiContent, ApiContentBlock, ApiMessage, MessageRequest};

/// Environment fallback for the API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    ///
    /// # API Key Resolution
    /// 1. `config.api_key` if set
    /// 2. `ANTHROPIC_API_KEY` environment variable
    /// 3. Returns error if neither is available
    pub fn new(config: &AnthropicConfig) -> Result<Self, ParlorError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(&api_key, &config.api_version, &config.base_url)?;

        info!(
            model = config.default_model,
            base_url = config.base_url,
            "Anthropic provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: AnthropicClient) -> Self {
        Self { client }
    }

    /// Converts a [`ProviderRequest`] to an Anthropic [`MessageRequest`].
    fn to_message_request(&self, request: &ProviderRequest) -> MessageRequest {
        let messages: Vec<ApiMessage> = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.clone(),
                content: convert_content_blocks(&m.content),
            })
            .collect();

        // Convert tool definitions from serde_json::Value to ToolDefinition structs.
        let tools = request
            .tools
            .as_ref()
            .map(|tool_values| {
                tool_values
                    .iter()
                    .filter_map(|v| {
                        serde_json::from_value::<crate::types::ToolDefinition>(v.clone()).ok()
                    })
                    .collect::<Vec<_>>()
            })
            .and_then(|v| if v.is_empty() { None } else { Some(v) });

        MessageRequest {
            model: request.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: request.stream,
            tools,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParlorError> {
        // No API call: health checks must not consume tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParlorError> {
        debug!("Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, ParlorError> {
        let api_request = self.to_message_request(&request);
        let response = self.client.open_stream(&api_request).await?;
        Ok(sse::decode(response))
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, ParlorError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            ParlorError::Config(
                "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
            )
        })
}

/// Converts core [`ContentBlock`]s to Anthropic API [`ApiContent`].
fn convert_content_blocks(blocks: &[ContentBlock]) -> ApiContent {
    if blocks.len() == 1
        && let ContentBlock::Text { text } = &blocks[0]
    {
        return ApiContent::Text(text.clone());
    }

    let api_blocks: Vec<ApiContentBlock> = blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => ApiContentBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ApiContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: is_error.then_some(true),
            },
        })
        .collect();

    ApiContent::Blocks(api_blocks)
}
