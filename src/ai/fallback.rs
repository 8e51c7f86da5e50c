//! Static prediction returned whenever model generation fails.

use serde_json::{json, Value};

pub const FALLBACK_NOTE: &str = "Fallback predictions - AI service temporarily unavailable";

/// The fixed fallback payload. Always returned whole, never merged.
pub fn fallback_predictions() -> Value {
    json!({
        "predictions": [
            {"driver": "Max Verstappen", "position": 1, "confidence": 0.85, "reasoning": "Championship leader with consistent performance"},
            {"driver": "Lewis Hamilton", "position": 2, "confidence": 0.75, "reasoning": "Experienced racecraft and strategic excellence"},
            {"driver": "Charles Leclerc", "position": 3, "confidence": 0.70, "reasoning": "Strong qualifying pace and competitive machinery"},
            {"driver": "George Russell", "position": 4, "confidence": 0.65, "reasoning": "Solid consistency and team coordination"},
            {"driver": "Carlos Sainz", "position": 5, "confidence": 0.60, "reasoning": "Good race management and strategic flexibility"}
        ],
        "key_factors": ["Track temperature", "Tire degradation", "Weather conditions", "Pit stop timing"],
        "weather_impact": "Clear conditions expected, favoring optimal race strategies",
        "tire_strategy": "Medium-Hard compound strategy recommended for race distance",
        "safety_car_probability": 0.6,
        "note": FALLBACK_NOTE
    })
}
