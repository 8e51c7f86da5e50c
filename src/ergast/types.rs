//! Records returned by the stats API.
//!
//! Field names follow the upstream JSON so records serialize back unchanged.
//! Numbers arrive as strings upstream and are kept that way. Keys that are
//! not modelled are carried in `extra`, and absent optional keys stay absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub circuit_name: String,
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub given_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    pub constructor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One classified finisher in a race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_text: Option<String>,
    pub points: String,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualifyingResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub position: String,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(rename = "Q1", default, skip_serializing_if = "Option::is_none")]
    pub q1: Option<String>,
    #[serde(rename = "Q2", default, skip_serializing_if = "Option::is_none")]
    pub q2: Option<String>,
    #[serde(rename = "Q3", default, skip_serializing_if = "Option::is_none")]
    pub q3: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub driver_id: String,
    pub position: String,
    pub time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lap {
    pub number: String,
    #[serde(rename = "Timings", default)]
    pub timings: Vec<Timing>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A race weekend, optionally carrying results, qualifying or lap data
/// depending on which endpoint produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub season: String,
    pub round: String,
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Circuit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "Results", default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<RaceResult>,
    #[serde(
        rename = "QualifyingResults",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub qualifying_results: Vec<QualifyingResult>,
    #[serde(rename = "Laps", default, skip_serializing_if = "Vec::is_empty")]
    pub laps: Vec<Lap>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverStanding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_text: Option<String>,
    pub points: String,
    pub wins: String,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructors", default)]
    pub constructors: Vec<Constructor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DriverStanding {
    /// Classified position, or the position text for unclassified entries.
    pub fn display_position(&self) -> &str {
        self.position
            .as_deref()
            .or(self.position_text.as_deref())
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStanding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_text: Option<String>,
    pub points: String,
    pub wins: String,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregated career numbers for one driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerStats {
    pub total_races: u32,
    pub wins: u32,
    pub podiums: u32,
    pub total_points: f64,
    pub win_percentage: f64,
    pub podium_percentage: f64,
}

impl CareerStats {
    /// Aggregate over every result of every race. Unparseable points count as zero.
    pub fn from_races(races: &[Race]) -> Self {
        let total_races = races.len() as u32;
        let results = || races.iter().flat_map(|race| race.results.iter());

        let wins = results().filter(|r| r.position == "1").count() as u32;
        let podiums = results()
            .filter(|r| matches!(r.position.as_str(), "1" | "2" | "3"))
            .count() as u32;
        let total_points = results()
            .map(|r| r.points.trim().parse::<f64>().unwrap_or(0.0))
            .sum();

        let percentage = |count: u32| {
            if total_races > 0 {
                count as f64 / total_races as f64 * 100.0
            } else {
                0.0
            }
        };

        Self {
            total_races,
            wins,
            podiums,
            total_points,
            win_percentage: percentage(wins),
            podium_percentage: percentage(podiums),
        }
    }
}
