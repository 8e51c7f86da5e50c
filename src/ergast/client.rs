//! HTTP client for the stats API.

use anyhow::{Context, Result};
use chrono::Datelike;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{CareerStats, Circuit, ConstructorStanding, DriverStanding, Lap, Race};
use crate::config::ErgastConfig;
use crate::error::UpstreamError;

const RACES_PATH: &str = "/MRData/RaceTable/Races";
const STANDINGS_PATH: &str = "/MRData/StandingsTable/StandingsLists";
const CIRCUITS_PATH: &str = "/MRData/CircuitTable/Circuits";

/// Read-only stats API client.
///
/// Public lookups never fail: upstream errors are logged and replaced
/// by an empty collection or `None`.
#[derive(Debug, Clone)]
pub struct ErgastClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    long_timeout: Duration,
}

/// One entry of `StandingsLists`; only the table matching the endpoint is present.
#[derive(serde::Deserialize)]
struct StandingsList {
    #[serde(rename = "DriverStandings", default)]
    driver_standings: Vec<DriverStanding>,
    #[serde(rename = "ConstructorStandings", default)]
    constructor_standings: Vec<ConstructorStanding>,
}

impl ErgastClient {
    pub fn new(config: &ErgastConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("f1-forecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build stats HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            long_timeout: config.long_timeout(),
        })
    }

    /// Schedule of the current calendar year's season.
    pub async fn current_season(&self) -> Vec<Race> {
        self.season_schedule(chrono::Utc::now().year()).await
    }

    pub async fn season_schedule(&self, season: i32) -> Vec<Race> {
        let url = super::season_url(&self.base_url, season);
        self.fetch::<Vec<Race>>(&url, RACES_PATH, self.timeout)
            .await
            .unwrap_or_else(|e| degrade("season data", e))
    }

    /// Driver standings; `None` means the current season.
    pub async fn driver_standings(&self, season: Option<i32>) -> Vec<DriverStanding> {
        let season = season.unwrap_or_else(|| chrono::Utc::now().year());
        let url = super::driver_standings_url(&self.base_url, season);
        self.first_standings_list(&url)
            .await
            .map(|list| list.driver_standings)
            .unwrap_or_else(|e| degrade("driver standings", e))
    }

    /// Constructor standings; `None` means the current season.
    pub async fn constructor_standings(&self, season: Option<i32>) -> Vec<ConstructorStanding> {
        let season = season.unwrap_or_else(|| chrono::Utc::now().year());
        let url = super::constructor_standings_url(&self.base_url, season);
        self.first_standings_list(&url)
            .await
            .map(|list| list.constructor_standings)
            .unwrap_or_else(|e| degrade("constructor standings", e))
    }

    pub async fn race_results(&self, season: i32, round: u32) -> Option<Race> {
        let url = super::race_results_url(&self.base_url, season, round);
        self.first::<Race>(&url, RACES_PATH, self.timeout)
            .await
            .unwrap_or_else(|e| degrade("race results", e))
    }

    pub async fn qualifying_results(&self, season: i32, round: u32) -> Option<Race> {
        let url = super::qualifying_url(&self.base_url, season, round);
        self.first::<Race>(&url, RACES_PATH, self.timeout)
            .await
            .unwrap_or_else(|e| degrade("qualifying results", e))
    }

    pub async fn circuit_info(&self, circuit_id: &str) -> Option<Circuit> {
        let url = super::circuit_url(&self.base_url, circuit_id);
        self.first::<Circuit>(&url, CIRCUITS_PATH, self.timeout)
            .await
            .unwrap_or_else(|e| degrade("circuit info", e))
    }

    /// Career totals across every race the driver entered.
    ///
    /// A driver with no recorded races yields all-zero stats.
    pub async fn driver_career_stats(&self, driver_id: &str) -> Option<CareerStats> {
        let url = super::driver_results_url(&self.base_url, driver_id);
        match self
            .fetch::<Vec<Race>>(&url, RACES_PATH, self.long_timeout)
            .await
        {
            Ok(races) => Some(CareerStats::from_races(&races)),
            Err(e) => degrade("driver career stats", e),
        }
    }

    /// Lap timings for one lap, or for every lap when `lap` is `None`.
    pub async fn lap_times(&self, season: i32, round: u32, lap: Option<u32>) -> Vec<Lap> {
        let url = super::lap_times_url(&self.base_url, season, round, lap);
        self.first::<Race>(&url, RACES_PATH, self.long_timeout)
            .await
            .map(|race| race.map(|r| r.laps).unwrap_or_default())
            .unwrap_or_else(|e| degrade("lap times", e))
    }

    async fn first_standings_list(&self, url: &str) -> Result<StandingsList, UpstreamError> {
        let list = self
            .first::<StandingsList>(url, STANDINGS_PATH, self.timeout)
            .await?;
        Ok(list.unwrap_or(StandingsList {
            driver_standings: Vec::new(),
            constructor_standings: Vec::new(),
        }))
    }

    async fn first<T: DeserializeOwned>(
        &self,
        url: &str,
        pointer: &'static str,
        timeout: Duration,
    ) -> Result<Option<T>, UpstreamError> {
        let items: Vec<T> = self.fetch(url, pointer, timeout).await?;
        Ok(items.into_iter().next())
    }

    /// GET `url` and decode the value found at the JSON `pointer`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        pointer: &'static str,
        timeout: Duration,
    ) -> Result<T, UpstreamError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        let target = body
            .pointer_mut(pointer)
            .map(Value::take)
            .ok_or_else(|| UpstreamError::MissingPath {
                url: url.to_string(),
                path: pointer,
            })?;

        serde_json::from_value(target).map_err(|e| UpstreamError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn degrade<T: Default>(what: &str, err: UpstreamError) -> T {
    warn!("Failed to fetch {}: {}", what, err);
    T::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ErgastClient {
        ErgastClient::new(&ErgastConfig {
            base_url: server.base_url(),
            timeout_secs: 1,
            long_timeout_secs: 1,
        })
        .unwrap()
    }

    fn race_json(round: &str, position: &str, points: &str) -> serde_json::Value {
        json!({
            "season": "2023",
            "round": round,
            "raceName": "Italian Grand Prix",
            "Circuit": {"circuitId": "monza", "circuitName": "Autodromo Nazionale di Monza"},
            "date": "2023-09-03",
            "Results": [{
                "number": "1",
                "position": position,
                "positionText": position,
                "points": points,
                "Driver": {"driverId": "max_verstappen", "code": "VER", "givenName": "Max", "familyName": "Verstappen"},
                "Constructor": {"constructorId": "red_bull", "name": "Red Bull"},
                "grid": "1",
                "laps": "51",
                "status": "Finished"
            }]
        })
    }

    #[tokio::test]
    async fn test_race_results_extracts_first_race() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/2023/14/results.json");
                then.status(200)
                    .json_body(json!({"MRData": {"RaceTable": {"Races": [race_json("14", "1", "25")]}}}));
            })
            .await;

        let race = client_for(&server).race_results(2023, 14).await.unwrap();
        mock.assert_async().await;
        assert_eq!(race.race_name, "Italian Grand Prix");
        assert_eq!(race.results[0].driver.full_name(), "Max Verstappen");
    }

    #[tokio::test]
    async fn test_non_200_degrades_to_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(503);
            })
            .await;

        let client = client_for(&server);
        assert!(client.season_schedule(2024).await.is_empty());
        assert!(client.driver_standings(Some(2024)).await.is_empty());
        assert!(client.race_results(2024, 1).await.is_none());
        assert!(client.circuit_info("monza").await.is_none());
        assert!(client.driver_career_stats("hamilton").await.is_none());
        assert!(client.lap_times(2024, 1, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_degrades() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2024.json");
                then.status(200).body("<html>not json</html>");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2024/3/qualifying.json");
                then.status(200).json_body(json!({"MRData": {"total": "0"}}));
            })
            .await;

        let client = client_for(&server);
        assert!(client.season_schedule(2024).await.is_empty());
        assert!(client.qualifying_results(2024, 3).await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_degrades() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2024/driverStandings.json");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({"MRData": {"StandingsTable": {"StandingsLists": []}}}));
            })
            .await;

        assert!(client_for(&server)
            .driver_standings(Some(2024))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_constructor_standings_first_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2023/constructorStandings.json");
                then.status(200).json_body(json!({"MRData": {"StandingsTable": {"StandingsLists": [{
                    "season": "2023",
                    "round": "22",
                    "ConstructorStandings": [{
                        "position": "1",
                        "positionText": "1",
                        "points": "860",
                        "wins": "21",
                        "Constructor": {"constructorId": "red_bull", "name": "Red Bull"}
                    }]
                }]}}}));
            })
            .await;

        let standings = client_for(&server).constructor_standings(Some(2023)).await;
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].constructor.name, "Red Bull");
        assert_eq!(standings[0].wins, "21");
    }

    #[tokio::test]
    async fn test_career_stats_uses_limit_and_aggregates() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/drivers/max_verstappen/results.json")
                    .query_param("limit", "1000");
                then.status(200).json_body(json!({"MRData": {"RaceTable": {"Races": [
                    race_json("1", "1", "25"),
                    race_json("2", "2", "18"),
                ]}}}));
            })
            .await;

        let stats = client_for(&server)
            .driver_career_stats("max_verstappen")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(stats.total_races, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.podiums, 2);
        assert!((stats.total_points - 43.0).abs() < 1e-9);
        assert!((stats.win_percentage - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_career_stats_no_races_is_zeroed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/drivers/nobody/results.json");
                then.status(200)
                    .json_body(json!({"MRData": {"RaceTable": {"Races": []}}}));
            })
            .await;

        let stats = client_for(&server)
            .driver_career_stats("nobody")
            .await
            .unwrap();
        assert_eq!(stats.total_races, 0);
        assert_eq!(stats.win_percentage, 0.0);
        assert_eq!(stats.podium_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_lap_times_single_lap() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2023/1/laps/1.json");
                then.status(200).json_body(json!({"MRData": {"RaceTable": {"Races": [{
                    "season": "2023",
                    "round": "1",
                    "raceName": "Bahrain Grand Prix",
                    "Circuit": {"circuitId": "bahrain", "circuitName": "Bahrain International Circuit"},
                    "Laps": [{"number": "1", "Timings": [
                        {"driverId": "max_verstappen", "position": "1", "time": "1:39.019"},
                        {"driverId": "leclerc", "position": "2", "time": "1:39.910"}
                    ]}]
                }]}}}));
            })
            .await;

        let laps = client_for(&server).lap_times(2023, 1, Some(1)).await;
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].timings[1].driver_id, "leclerc");
    }
}
