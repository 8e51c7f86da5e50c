//! Dashboard telemetry snapshot.
//!
//! No live telemetry source exists; the dashboard gauges are fed a fixed snapshot.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Gauge {
    pub current: f64,
    pub min: u32,
    pub max: u32,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct GearGauge {
    pub current: u8,
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackData {
    pub lap: u32,
    pub sector_times: Vec<f64>,
    pub position_data: Vec<TrackPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub engine_rpm: Gauge,
    pub gear: GearGauge,
    pub speed: Gauge,
    pub track_data: TrackData,
}

impl TelemetrySnapshot {
    pub fn dashboard() -> Self {
        Self {
            engine_rpm: Gauge {
                current: 6646.51,
                min: 0,
                max: 12000,
                unit: "RPM",
            },
            gear: GearGauge {
                current: 5,
                min: 0,
                max: 8,
            },
            speed: Gauge {
                current: 130.45,
                min: 0,
                max: 350,
                unit: "km/h",
            },
            track_data: TrackData {
                lap: 2,
                sector_times: vec![23.456, 28.789, 31.234],
                position_data: [(100, 200), (150, 180), (200, 160), (250, 140), (300, 130)]
                    .into_iter()
                    .map(|(x, y)| TrackPoint { x, y })
                    .collect(),
            },
        }
    }
}
