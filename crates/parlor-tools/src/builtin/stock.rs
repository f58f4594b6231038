// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Latest stock quote backed by Alpha Vantage's GLOBAL_QUOTE endpoint.

use async_trait::async_trait;
use parlor_core::ParlorError;
use serde::{Deserialize, Serialize};

use super::{endpoint, http_failure};
use crate::tool::Tool;

const TOOL_NAME: &str = "getStockPrice";

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuote>,
}

/// Alpha Vantage returns every field as a string, and an empty object for
/// unknown symbols.
#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockQuote {
    symbol: String,
    price: f64,
    change: f64,
    change_percent: String,
    timestamp: String,
}

impl GlobalQuote {
    /// `None` when the quote carries no usable price.
    fn into_quote(self, requested: &str) -> Option<StockQuote> {
        let price: f64 = self.price.as_deref()?.trim().parse().ok()?;
        if price == 0.0 {
            return None;
        }
        Some(StockQuote {
            symbol: self.symbol.unwrap_or_else(|| requested.to_string()),
            price,
            change: self
                .change
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or(0.0),
            change_percent: self.change_percent.unwrap_or_default(),
            timestamp: self.latest_trading_day.unwrap_or_default(),
        })
    }
}

/// Looks up the latest quote for a ticker symbol.
pub struct StockTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl StockTool {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    async fn fetch(&self, symbol: &str, api_key: &str) -> Result<StockQuote, String> {
        let url = reqwest::Url::parse_with_params(
            &endpoint(&self.base_url, "query"),
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", api_key),
            ],
        )
        .map_err(|e| e.to_string())?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(http_failure)?
            .error_for_status()
            .map_err(http_failure)?;
        let body: QuoteEnvelope = response.json().await.map_err(http_failure)?;

        body.quote
            .and_then(|q| q.into_quote(symbol))
            .ok_or_else(|| format!("Symbol {symbol} not found"))
    }
}

#[async_trait]
impl Tool for StockTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get the current stock price for a ticker symbol"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Ticker symbol, e.g. \"AAPL\""
                }
            },
            "required": ["symbol"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, ParlorError> {
        let symbol = input["symbol"].as_str().unwrap_or_default().to_uppercase();
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ParlorError::tool_failed(TOOL_NAME, "Alpha Vantage API key not configured"))?;

        let quote = self.fetch(&symbol, api_key).await.map_err(|cause| {
            ParlorError::tool_failed(TOOL_NAME, format!("Failed to fetch stock price: {cause}"))
        })?;
        serde_json::to_value(quote).map_err(|e| ParlorError::tool_failed(TOOL_NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_returning(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn parses_global_quote() {
        let server = server_returning(serde_json::json!({
            "Global Quote": {
                "01. symbol": "AAPL",
                "05. price": "189.8400",
                "07. latest trading day": "2026-10-16",
                "09. change": "-1.2100",
                "10. change percent": "-0.6334%"
            }
        }))
        .await;

        let tool = StockTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
        let out = tool
            .invoke(serde_json::json!({ "symbol": "aapl" }))
            .await
            .unwrap();
        assert_eq!(out["symbol"], "AAPL");
        assert_eq!(out["price"], 189.84);
        assert_eq!(out["change"], -1.21);
        assert_eq!(out["changePercent"], "-0.6334%");
        assert_eq!(out["timestamp"], "2026-10-16");
    }

    #[tokio::test]
    async fn empty_quote_means_unknown_symbol() {
        let server = server_returning(serde_json::json!({ "Global Quote": {} })).await;
        let tool = StockTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
        let err = tool
            .invoke(serde_json::json!({ "symbol": "ZZZZINVALID" }))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch stock price: Symbol ZZZZINVALID not found"
        );
    }

    #[tokio::test]
    async fn zero_price_means_unknown_symbol() {
        let server = server_returning(serde_json::json!({
            "Global Quote": { "01. symbol": "NOPE", "05. price": "0.0000" }
        }))
        .await;
        let tool = StockTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
        let err = tool
            .invoke(serde_json::json!({ "symbol": "NOPE" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn missing_key_fails() {
        let tool = StockTool::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let err = tool
            .invoke(serde_json::json!({ "symbol": "AAPL" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Alpha Vantage API key not configured");
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("symbol", "AAPL"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let tool = StockTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
        let err = tool
            .invoke(serde_json::json!({ "symbol": "AAPL" }))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch stock price:"));
    }

    #[tokio::test]
    async fn upstream_failure_does_not_reveal_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let tool = StockTool::new(
            reqwest::Client::new(),
            &server.uri(),
            Some("SUPERSECRETKEY".into()),
        );
        let err = tool
            .invoke(serde_json::json!({ "symbol": "AAPL" }))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("503"), "got: {err}");
        assert!(!err.contains("SUPERSECRETKEY"), "got: {err}");
        assert!(!err.contains("apikey"), "got: {err}");

        // Unreachable upstream: the connect error must not carry the URL either.
        let tool = StockTool::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            Some("SUPERSECRETKEY".into()),
        );
        let err = tool
            .invoke(serde_json::json!({ "symbol": "AAPL" }))
            .await
            .unwrap_err()
            .to_string();
        assert!(!err.contains("SUPERSECRETKEY"), "got: {err}");
    }

    #[tokio::test]
    async fn zero_price_in_any_format_means_unknown_symbol() {
        for price in ["0", "0.00", " 0.0000"] {
            let server = server_returning(serde_json::json!({
                "Global Quote": { "01. symbol": "NOPE", "05. price": price }
            }))
            .await;
            let tool = StockTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
            let err = tool
                .invoke(serde_json::json!({ "symbol": "NOPE" }))
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Failed to fetch stock price: Symbol NOPE not found",
                "price {price:?}"
            );
        }
    }
}
