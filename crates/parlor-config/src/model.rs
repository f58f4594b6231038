// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parlor chat proxy.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The assistant persona sent with every model request unless overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and friendly AI assistant. You can help with:\n1. Answering general questions\n2. Providing information on weather, stocks, and F1 racing\n3. Having conversations about various topics\n\nAlways be conversational and helpful. If the user asks something you can't help with, be honest about your limitations.";

/// Top-level Parlor configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParlorConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Bearer tokens accepted by the gateway.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Conversation behavior: prompt, sampling and limits.
    #[serde(default)]
    pub chat: ChatConfig,

    /// External lookup tools.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Response encoding settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bearer-token authentication configuration.
///
/// An empty token list rejects every request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<ApiTokenConfig>,
}

/// A single bearer token and the identity it authenticates as.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiTokenConfig {
    pub token: String,
    pub user_id: String,
}

impl fmt::Debug for ApiTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiTokenConfig")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Anthropic API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model to use for LLM requests.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Base URL of the Messages API.
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            base_url: default_anthropic_base_url(),
        }
    }
}

impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

/// Conversation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// System instructions sent with every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Sampling temperature in `[0, 1]`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Ceiling on the duration of one streamed response, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of model rounds that may request tools in one turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_tool_rounds() -> u32 {
    5
}

/// External lookup tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Offer the tools to the model at all.
    #[serde(default = "default_tools_enabled")]
    pub enabled: bool,

    /// Timeout for a single upstream tool request, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub weather: WeatherToolConfig,

    #[serde(default)]
    pub stock: StockToolConfig,

    #[serde(default)]
    pub race: RaceToolConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_tools_enabled(),
            timeout_secs: default_tool_timeout_secs(),
            weather: WeatherToolConfig::default(),
            stock: StockToolConfig::default(),
            race: RaceToolConfig::default(),
        }
    }
}

fn default_tools_enabled() -> bool {
    true
}

fn default_tool_timeout_secs() -> u64 {
    10
}

/// OpenWeatherMap settings for `getWeather`.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherToolConfig {
    /// API key. `None` falls back to `OPENWEATHERMAP_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

impl Default for WeatherToolConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
        }
    }
}

impl fmt::Debug for WeatherToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherToolConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

/// Alpha Vantage settings for `getStockPrice`.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StockToolConfig {
    /// API key. `None` falls back to `ALPHA_VANTAGE_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_stock_base_url")]
    pub base_url: String,
}

impl Default for StockToolConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_stock_base_url(),
        }
    }
}

impl fmt::Debug for StockToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StockToolConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_stock_base_url() -> String {
    "https://www.alphavantage.co".to_string()
}

/// Ergast-compatible race calendar settings for `getNextRace`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RaceToolConfig {
    #[serde(default = "default_race_base_url")]
    pub base_url: String,
}

impl Default for RaceToolConfig {
    fn default() -> Self {
        Self {
            base_url: default_race_base_url(),
        }
    }
}

fn default_race_base_url() -> String {
    "https://api.jolpi.ca/ergast/f1".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("parlor").join("parlor.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parlor.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// How streamed responses are encoded when the client does not ask for a format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultEncoding {
    /// One server-sent event frame per chat event.
    #[default]
    Framed,
    /// Text deltas only, concatenated.
    Plain,
}

/// Gateway response settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub default_encoding: DefaultEncoding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = ParlorConfig::default();
        config.anthropic.api_key = Some("sk-ant-secret".into());
        config.tools.weather.api_key = Some("owm-secret".into());
        config.auth.tokens.push(ApiTokenConfig {
            token: "bearer-secret".into(),
            user_id: "alice".into(),
        });

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(!debug.contains("owm-secret"));
        assert!(!debug.contains("bearer-secret"));
        assert!(debug.contains("alice"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_encoding_parses_lowercase() {
        let config: GatewayConfig = toml::from_str("default_encoding = \"plain\"").unwrap();
        assert_eq!(config.default_encoding, DefaultEncoding::Plain);
    }

    #[test]
    fn default_prompt_mentions_the_tools() {
        let chat = ChatConfig::default();
        assert!(chat.system_prompt.contains("weather, stocks, and F1 racing"));
        assert!((chat.temperature - 0.7).abs() < f32::EPSILON);
    }
}
