// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlor status` command implementation.
//!
//! Probes the gateway's `/health` endpoint and reports whether the server
//! is running and whether its storage is healthy. Falls back gracefully
//! when the server is not running.

use std::io::IsTerminal;
use std::time::Duration;

use parlor_config::model::ParlorConfig;
use parlor_core::ParlorError;
use serde::{Deserialize, Serialize};

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    storage: String,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub storage: Option<String>,
    pub url: String,
}

/// The address to probe. Wildcard binds are probed over loopback.
fn health_url(config: &ParlorConfig) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        host => host,
    };
    format!("http://{host}:{}/health", config.server.port)
}

/// Run the `parlor status` command.
pub async fn run_status(config: &ParlorConfig, json: bool) -> Result<(), ParlorError> {
    let url = health_url(config);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| ParlorError::Internal(format!("failed to create HTTP client: {e}")))?;

    // A degraded server answers 503 with the same body, so the status code is not checked.
    let health = match client.get(&url).send().await {
        Ok(resp) => resp.json::<HealthResponse>().await.ok(),
        Err(e) => {
            tracing::debug!(error = %e, %url, "health probe failed");
            None
        }
    };

    let report = match health {
        Some(health) => StatusResponse {
            running: true,
            status: health.status,
            storage: Some(health.storage),
            url,
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            storage: None,
            url,
        },
    };

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| ParlorError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        print_status(&report, std::io::stdout().is_terminal());
    }
    Ok(())
}

fn print_status(report: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  parlor status");
    println!("  {}", "-".repeat(35));

    let state = if report.running {
        format!("[OK] {}", report.status)
    } else {
        format!("[--] {}", report.status)
    };
    let state = match (use_color, report.running && report.status == "ok") {
        (false, _) => state.normal(),
        (true, true) => state.green(),
        (true, false) => state.yellow(),
    };
    println!("    State:    {state}");
    if let Some(storage) = &report.storage {
        println!("    Storage:  {storage}");
    }
    println!("    Endpoint: {}", report.url);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_host_is_probed_on_loopback() {
        let mut config = ParlorConfig::default();
        config.server.host = "0.0.0.0".into();
        config.server.port = 8080;
        assert_eq!(health_url(&config), "http://127.0.0.1:8080/health");

        config.server.host = "10.0.0.5".into();
        assert_eq!(health_url(&config), "http://10.0.0.5:8080/health");
    }

    #[test]
    fn status_response_serializes() {
        let json = serde_json::to_value(StatusResponse {
            running: false,
            status: "not running".into(),
            storage: None,
            url: "http://127.0.0.1:3000/health".into(),
        })
        .unwrap();
        assert_eq!(json["running"], false);
        assert!(json["storage"].is_null());
    }

    #[tokio::test]
    async fn offline_server_is_reported_without_error() {
        let mut config = ParlorConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 1;
        run_status(&config, true).await.unwrap();
    }
}
