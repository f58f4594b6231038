// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools: current weather, stock quotes, and the next F1 race.

pub mod race;
pub mod stock;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use parlor_config::model::ToolsConfig;
use parlor_core::ParlorError;

use crate::tool::ToolRegistry;

/// Environment fallback for the weather API key.
pub const WEATHER_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
/// Environment fallback for the stock API key.
pub const STOCK_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// Registers all built-in tools into the given registry.
///
/// Tools are always registered, even without an API key: a keyless tool
/// fails each invocation with a "not configured" message the model can
/// relay to the user.
pub fn register_builtins(
    registry: &mut ToolRegistry,
    config: &ToolsConfig,
) -> Result<(), ParlorError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ParlorError::Internal(format!("failed to build tool HTTP client: {e}")))?;

    let weather_key = resolve_key(config.weather.api_key.as_deref(), WEATHER_KEY_ENV);
    let stock_key = resolve_key(config.stock.api_key.as_deref(), STOCK_KEY_ENV);

    registry.register(Arc::new(weather::WeatherTool::new(
        client.clone(),
        &config.weather.base_url,
        weather_key,
    )))?;
    registry.register(Arc::new(stock::StockTool::new(
        client.clone(),
        &config.stock.base_url,
        stock_key,
    )))?;
    registry.register(Arc::new(race::RaceTool::new(client, &config.race.base_url)))?;
    Ok(())
}

/// Config value first, then the environment. Blank values count as unset.
fn resolve_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    let usable = |key: &String| !key.trim().is_empty();
    configured
        .map(str::to_string)
        .filter(usable)
        .or_else(|| std::env::var(env_var).ok().filter(usable))
}

/// Renders an HTTP failure for the model. The request URL carries the API
/// key in its query string, so it is stripped first.
pub(crate) fn http_failure(error: reqwest::Error) -> String {
    error.without_url().to_string()
}

/// Joins a base URL and a path segment without doubling slashes.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
