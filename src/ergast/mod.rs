//! Client for the Ergast Formula 1 stats API.
//!
//! Every lookup is a read-only GET against a fixed path template. Failures
//! degrade to an empty collection or `None` and are logged.

pub mod client;
pub mod types;

pub use client::ErgastClient;
pub use types::{CareerStats, Circuit, ConstructorStanding, DriverStanding, Lap, Race};

/// Build season schedule URL
pub fn season_url(base: &str, season: i32) -> String {
    format!("{}/{}.json", base, season)
}

/// Build driver standings URL
pub fn driver_standings_url(base: &str, season: i32) -> String {
    format!("{}/{}/driverStandings.json", base, season)
}

/// Build constructor standings URL
pub fn constructor_standings_url(base: &str, season: i32) -> String {
    format!("{}/{}/constructorStandings.json", base, season)
}

/// Build race results URL
pub fn race_results_url(base: &str, season: i32, round: u32) -> String {
    format!("{}/{}/{}/results.json", base, season, round)
}

/// Build qualifying results URL
pub fn qualifying_url(base: &str, season: i32, round: u32) -> String {
    format!("{}/{}/{}/qualifying.json", base, season, round)
}

/// Build circuit info URL
pub fn circuit_url(base: &str, circuit_id: &str) -> String {
    format!("{}/circuits/{}.json", base, circuit_id)
}

/// Build URL listing every race result of a driver
pub fn driver_results_url(base: &str, driver_id: &str) -> String {
    format!("{}/drivers/{}/results.json?limit=1000", base, driver_id)
}

/// Build lap times URL, for one lap or the whole race
pub fn lap_times_url(base: &str, season: i32, round: u32, lap: Option<u32>) -> String {
    match lap {
        Some(lap) => format!("{}/{}/{}/laps/{}.json", base, season, round, lap),
        None => format!("{}/{}/{}/laps.json?limit=2000", base, season, round),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://ergast.com/api/f1";

    #[test]
    fn test_url_templates() {
        assert_eq!(season_url(BASE, 2024), "http://ergast.com/api/f1/2024.json");
        assert_eq!(
            race_results_url(BASE, 2024, 5),
            "http://ergast.com/api/f1/2024/5/results.json"
        );
        assert_eq!(
            driver_results_url(BASE, "hamilton"),
            "http://ergast.com/api/f1/drivers/hamilton/results.json?limit=1000"
        );
        assert_eq!(
            circuit_url(BASE, "monza"),
            "http://ergast.com/api/f1/circuits/monza.json"
        );
    }

    #[test]
    fn test_lap_times_url_variants() {
        assert_eq!(
            lap_times_url(BASE, 2023, 1, Some(12)),
            "http://ergast.com/api/f1/2023/1/laps/12.json"
        );
        assert_eq!(
            lap_times_url(BASE, 2023, 1, None),
            "http://ergast.com/api/f1/2023/1/laps.json?limit=2000"
        );
    }
}
