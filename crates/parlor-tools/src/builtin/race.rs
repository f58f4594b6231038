// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Next Formula 1 race, from the Ergast-compatible season schedule.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use parlor_core::ParlorError;
use serde::{Deserialize, Serialize};

use super::{endpoint, http_failure};
use crate::tool::Tool;

const TOOL_NAME: &str = "getNextRace";

#[derive(Debug, Deserialize)]
struct ScheduleEnvelope {
    #[serde(rename = "MRData")]
    data: MrData,
}

#[derive(Debug, Deserialize)]
struct MrData {
    #[serde(rename = "RaceTable")]
    race_table: RaceTable,
}

#[derive(Debug, Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<Race>,
}

/// One scheduled Grand Prix.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub round: String,
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Circuit,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_name: String,
    #[serde(rename = "Location")]
    pub location: CircuitLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitLocation {
    pub locality: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
struct NextRace {
    round: String,
    name: String,
    circuit: String,
    date: String,
    time: String,
    location: String,
    url: String,
}

impl From<Race> for NextRace {
    fn from(race: Race) -> Self {
        Self {
            round: race.round,
            name: race.race_name,
            circuit: race.circuit.circuit_name,
            date: race.date,
            time: race.time.unwrap_or_else(|| "Time TBA".to_string()),
            location: format!(
                "{}, {}",
                race.circuit.location.locality, race.circuit.location.country
            ),
            url: race.url,
        }
    }
}

/// Picks the first race dated on or after `today`.
///
/// Races are assumed to be in calendar order; entries with unparseable dates
/// are skipped.
pub fn select_next_race(races: &[Race], today: NaiveDate) -> Option<&Race> {
    races.iter().find(|race| {
        NaiveDate::parse_from_str(&race.date, "%Y-%m-%d").is_ok_and(|date| date >= today)
    })
}

/// Looks up the next race of the current season.
pub struct RaceTool {
    client: reqwest::Client,
    base_url: String,
}

impl RaceTool {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    async fn fetch(&self, today: NaiveDate) -> Result<NextRace, String> {
        let year = today.year();
        let response = self
            .client
            .get(endpoint(&self.base_url, &format!("{year}.json")))
            .send()
            .await
            .map_err(http_failure)?
            .error_for_status()
            .map_err(http_failure)?;
        let body: ScheduleEnvelope = response.json().await.map_err(http_failure)?;

        let races = body.data.race_table.races;
        if races.is_empty() {
            return Err(format!("No races found for the {year} season"));
        }
        select_next_race(&races, today)
            .cloned()
            .map(NextRace::from)
            .ok_or_else(|| format!("No upcoming races in the {year} season"))
    }
}

#[async_trait]
impl Tool for RaceTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get details of the next Formula 1 race"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn invoke(&self, _input: serde_json::Value) -> Result<serde_json::Value, ParlorError> {
        let today = Utc::now().date_naive();
        let next = self.fetch(today).await.map_err(|cause| {
            ParlorError::tool_failed(TOOL_NAME, format!("Failed to fetch race info: {cause}"))
        })?;
        serde_json::to_value(next).map_err(|e| ParlorError::tool_failed(TOOL_NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn race(round: &str, date: &str, time: Option<&str>) -> serde_json::Value {
        let mut race = serde_json::json!({
            "season": "2999",
            "round": round,
            "url": format!("https://example.test/{round}"),
            "raceName": format!("Grand Prix {round}"),
            "Circuit": {
                "circuitId": "c",
                "circuitName": format!("Circuit {round}"),
                "Location": { "locality": "Monza", "country": "Italy" }
            },
            "date": date
        });
        if let Some(time) = time {
            race["time"] = serde_json::json!(time);
        }
        race
    }

    fn schedule(races: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({ "MRData": { "RaceTable": { "season": "2999", "Races": races } } })
    }

    fn parsed(races: Vec<serde_json::Value>) -> Vec<Race> {
        let envelope: ScheduleEnvelope = serde_json::from_value(schedule(races)).unwrap();
        envelope.data.race_table.races
    }

    #[test]
    fn selects_first_race_on_or_after_today() {
        let races = parsed(vec![
            race("1", "2026-03-01", None),
            race("2", "2026-04-12", None),
            race("3", "2026-05-03", None),
        ]);
        let today = NaiveDate::from_ymd_opt(2026, 4, 12).unwrap();
        assert_eq!(select_next_race(&races, today).unwrap().round, "2");

        let today = NaiveDate::from_ymd_opt(2026, 4, 13).unwrap();
        assert_eq!(select_next_race(&races, today).unwrap().round, "3");

        let today = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        assert!(select_next_race(&races, today).is_none());
    }

    #[test]
    fn missing_time_is_announced_as_tba() {
        let races = parsed(vec![race("7", "2026-06-01", None)]);
        let next = NextRace::from(races[0].clone());
        assert_eq!(next.time, "Time TBA");
        assert_eq!(next.location, "Monza, Italy");
        assert_eq!(next.circuit, "Circuit 7");
    }

    #[tokio::test]
    async fn fetches_current_season_schedule() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/\d{4}\.json$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schedule(vec![
                race("1", "1999-03-07", Some("06:00:00Z")),
                race("2", "2999-03-21", Some("13:00:00Z")),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let tool = RaceTool::new(reqwest::Client::new(), &server.uri());
        let out = tool.invoke(serde_json::json!({})).await.unwrap();
        assert_eq!(out["round"], "2");
        assert_eq!(out["name"], "Grand Prix 2");
        assert_eq!(out["time"], "13:00:00Z");
        assert_eq!(out["url"], "https://example.test/2");
    }

    #[tokio::test]
    async fn empty_season_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/\d{4}\.json$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schedule(vec![])))
            .mount(&server)
            .await;

        let tool = RaceTool::new(reqwest::Client::new(), &server.uri());
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Failed to fetch race info: No races found for the"));
    }

    #[tokio::test]
    async fn finished_season_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/\d{4}\.json$"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(schedule(vec![race("1", "1999-03-07", None)])),
            )
            .mount(&server)
            .await;

        let tool = RaceTool::new(reqwest::Client::new(), &server.uri());
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("No upcoming races in the"));
    }
}
