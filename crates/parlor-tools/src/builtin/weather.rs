// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Current weather lookup backed by OpenWeatherMap.

use async_trait::async_trait;
use parlor_core::ParlorError;
use serde::{Deserialize, Serialize};

use super::{endpoint, http_failure};
use crate::tool::Tool;

const TOOL_NAME: &str = "getWeather";

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    sys: OwmSys,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

/// The report handed back to the model. Temperatures are whole degrees Celsius.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeatherReport {
    location: String,
    country: String,
    temperature: i64,
    description: String,
    humidity: u32,
    wind_speed: f64,
    feels_like: i64,
}

impl From<OwmResponse> for WeatherReport {
    fn from(r: OwmResponse) -> Self {
        Self {
            location: r.name,
            country: r.sys.country,
            temperature: r.main.temp.round() as i64,
            description: r
                .weather
                .into_iter()
                .next()
                .map(|c| c.description)
                .unwrap_or_default(),
            humidity: r.main.humidity,
            wind_speed: r.wind.speed,
            feels_like: r.main.feels_like.round() as i64,
        }
    }
}

/// Looks up current conditions for a named location.
pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    async fn fetch(&self, location: &str, api_key: &str) -> Result<WeatherReport, String> {
        let url = reqwest::Url::parse_with_params(
            &endpoint(&self.base_url, "weather"),
            &[("q", location), ("appid", api_key), ("units", "metric")],
        )
        .map_err(|e| e.to_string())?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(http_failure)?;
        if !response.status().is_success() {
            return Err("Location not found".into());
        }
        let body: OwmResponse = response.json().await.map_err(http_failure)?;
        Ok(body.into())
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get the current weather for a location"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "minLength": 1,
                    "description": "City name, e.g. \"London\" or \"Paris, FR\""
                }
            },
            "required": ["location"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, ParlorError> {
        let location = input["location"].as_str().unwrap_or_default();
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ParlorError::tool_failed(TOOL_NAME, "OpenWeatherMap API key not configured"))?;

        let report = self.fetch(location, api_key).await.map_err(|cause| {
            ParlorError::tool_failed(TOOL_NAME, format!("Failed to fetch weather: {cause}"))
        })?;
        serde_json::to_value(report).map_err(|e| ParlorError::tool_failed(TOOL_NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london() -> serde_json::Value {
        serde_json::json!({
            "name": "London",
            "sys": { "country": "GB" },
            "main": { "temp": 12.4, "feels_like": 10.6, "humidity": 81 },
            "weather": [{ "description": "overcast clouds" }],
            "wind": { "speed": 4.1 }
        })
    }

    #[tokio::test]
    async fn reports_rounded_conditions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "k"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(1)
            .mount(&server)
            .await;

        let tool = WeatherTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
        let out = tool
            .invoke(serde_json::json!({ "location": "London" }))
            .await
            .unwrap();

        assert_eq!(out["location"], "London");
        assert_eq!(out["country"], "GB");
        assert_eq!(out["temperature"], 12);
        assert_eq!(out["feelsLike"], 11);
        assert_eq!(out["humidity"], 81);
        assert_eq!(out["windSpeed"], 4.1);
        assert_eq!(out["description"], "overcast clouds");
    }

    #[tokio::test]
    async fn unknown_location_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(
                serde_json::json!({ "cod": "404", "message": "city not found" }),
            ))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(reqwest::Client::new(), &server.uri(), Some("k".into()));
        let err = tool
            .invoke(serde_json::json!({ "location": "Atlantis" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch weather: Location not found");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london()))
            .expect(0)
            .mount(&server)
            .await;

        let tool = WeatherTool::new(reqwest::Client::new(), &server.uri(), None);
        let err = tool
            .invoke(serde_json::json!({ "location": "London" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenWeatherMap API key not configured");
    }

    #[tokio::test]
    async fn transport_failures_do_not_reveal_api_key() {
        // Connection refused.
        let tool = WeatherTool::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            Some("SUPERSECRETKEY".into()),
        );
        let err = tool
            .invoke(serde_json::json!({ "location": "London" }))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Failed to fetch weather:"), "got: {err}");
        assert!(!err.contains("SUPERSECRETKEY"), "got: {err}");

        // Malformed body.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let tool = WeatherTool::new(
            reqwest::Client::new(),
            &server.uri(),
            Some("SUPERSECRETKEY".into()),
        );
        let err = tool
            .invoke(serde_json::json!({ "location": "London" }))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Failed to fetch weather:"), "got: {err}");
        assert!(!err.contains("SUPERSECRETKEY"), "got: {err}");
        assert!(!err.contains("appid"), "got: {err}");
    }
}
