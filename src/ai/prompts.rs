//! Prompt templates.

use serde_json::Value;

fn pretty(data: &Value) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
}

/// Prompt asking for the top five finishers plus race context, as JSON.
pub fn race_prediction_prompt(race_data: &Value) -> String {
    format!(
        r#"Analyze the following Formula 1 race data and predict the outcome of the race.

Race Data: {data}

Provide:
1. The top 5 predicted finishing positions, each with a confidence score between 0 and 1 and a short reasoning
2. Key factors affecting the race outcome
3. Weather impact analysis
4. Tire strategy recommendations
5. The probability of a safety car, between 0 and 1

Reply with JSON using exactly this structure:
{{
    "predictions": [
        {{"driver": "Driver Name", "position": 1, "confidence": 0.85, "reasoning": "Why this driver finishes here"}}
    ],
    "key_factors": ["factor 1", "factor 2"],
    "weather_impact": "How conditions affect the race",
    "tire_strategy": "Recommended compound strategy",
    "safety_car_probability": 0.5
}}
The "predictions" list must contain exactly 5 entries ordered by position."#,
        data = pretty(race_data)
    )
}

/// Follow-up prompt for the secondary model, seeded with the primary reply.
pub fn strategic_insights_prompt(primary_reply: &str) -> String {
    format!(
        "Provide additional strategic insights for this F1 race prediction: {}",
        primary_reply
    )
}

pub fn driver_analysis_prompt(driver_name: &str) -> String {
    format!(
        r#"Analyze the performance of Formula 1 driver {name}, considering:
1. Recent race results and qualifying performances
2. Historical data and career statistics
3. Current season performance trends
4. Strengths and weaknesses
5. Comparison with teammates and competitors

Reply with JSON using this structure:
{{
    "driver_name": "{name}",
    "overall_rating": 8.5,
    "strengths": ["strength 1", "strength 2"],
    "weaknesses": ["weakness 1", "weakness 2"],
    "recent_form": "analysis",
    "career_highlights": ["highlight 1", "highlight 2"],
    "comparison_to_peers": "analysis",
    "season_prediction": "prediction"
}}"#,
        name = driver_name
    )
}

pub fn strategy_prompt(race_conditions: &Value) -> String {
    format!(
        r#"Based on these race conditions: {data}

Recommend an optimal race strategy covering:
1. Pit stop timing and tire choices
2. Fuel load strategies
3. Weather contingency plans
4. Risk versus reward analysis
5. Alternative strategies for different scenarios

Reply with JSON containing detailed recommendations."#,
        data = pretty(race_conditions)
    )
}
