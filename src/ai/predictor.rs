//! Race prediction orchestration.
//!
//! The primary model produces the prediction JSON; the optional secondary
//! model adds free-text commentary under `groq_insights`. Any primary
//! failure yields the static fallback payload instead.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::fallback::fallback_predictions;
use super::{prompts, GenerationRequest, LanguageModel};
use crate::error::AiError;
use crate::retry::{retry_if, RetryConfig};

/// Key under which secondary commentary is attached.
pub const INSIGHTS_KEY: &str = "groq_insights";

/// Outcome of a race prediction request.
#[derive(Debug)]
pub enum RaceForecast {
    /// Parsed primary model output, possibly with secondary insights
    Generated(Value),
    /// Generation failed; the static payload stands in
    Fallback { reason: AiError },
}

impl RaceForecast {
    pub fn is_fallback(&self) -> bool {
        matches!(self, RaceForecast::Fallback { .. })
    }

    /// Why the fallback stood in, if it did.
    pub fn fallback_reason(&self) -> Option<&AiError> {
        match self {
            RaceForecast::Fallback { reason } => Some(reason),
            RaceForecast::Generated(_) => None,
        }
    }

    /// Per-driver entries of a generated forecast. Empty for the fallback.
    pub fn driver_predictions(&self) -> Vec<DriverPrediction> {
        match self {
            RaceForecast::Generated(payload) => payload
                .get("predictions")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                        .collect()
                })
                .unwrap_or_default(),
            RaceForecast::Fallback { .. } => Vec::new(),
        }
    }

    /// JSON body handed to callers.
    pub fn into_payload(self) -> Value {
        match self {
            RaceForecast::Generated(payload) => payload,
            RaceForecast::Fallback { .. } => fallback_predictions(),
        }
    }
}

/// One entry of the `predictions` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverPrediction {
    pub driver: String,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error text for a failed driver analysis.
pub fn driver_analysis_error(err: &AiError) -> String {
    match err {
        AiError::EmptyReply { .. } => "No analysis generated".to_string(),
        other => format!("Driver analysis failed: {}", other),
    }
}

/// Error text for a failed strategy recommendation.
pub fn strategy_error(err: &AiError) -> String {
    match err {
        AiError::EmptyReply { .. } => "No strategy generated".to_string(),
        other => format!("Strategy generation failed: {}", other),
    }
}

pub struct RacePredictor {
    primary: Box<dyn LanguageModel>,
    secondary: Option<Box<dyn LanguageModel>>,
    temperature: f32,
    retry: RetryConfig,
}

impl RacePredictor {
    pub fn new(primary: Box<dyn LanguageModel>, secondary: Option<Box<dyn LanguageModel>>) -> Self {
        Self {
            primary,
            secondary,
            temperature: 0.7,
            retry: RetryConfig::none(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Predict the top five finishers for `race_data`.
    ///
    /// Never fails: primary errors produce [`RaceForecast::Fallback`]. Any
    /// JSON reply is returned as parsed; it must be an object only when
    /// secondary insights have to be attached to it.
    pub async fn generate_race_predictions(&self, race_data: &Value) -> RaceForecast {
        let (raw, predictions) = match self.primary_forecast(race_data).await {
            Ok(parsed) => parsed,
            Err(reason) => {
                error!("Error generating predictions: {}", reason);
                return RaceForecast::Fallback { reason };
            }
        };

        let Some(secondary) = &self.secondary else {
            info!("Generated race predictions with {}", self.primary.name());
            return RaceForecast::Generated(predictions);
        };

        let mut predictions = match predictions {
            Value::Object(map) => map,
            other => {
                let reason = AiError::InvalidJson {
                    service: self.primary.name(),
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                };
                error!("Error generating predictions: {}", reason);
                return RaceForecast::Fallback { reason };
            }
        };

        let prompt = prompts::strategic_insights_prompt(&raw);
        match secondary.generate(&prompt, &GenerationRequest::text()).await {
            Ok(insights) => {
                predictions.insert(INSIGHTS_KEY.to_string(), Value::String(insights));
            }
            Err(e) => warn!("Skipping {} insights: {}", secondary.name(), e),
        }

        info!("Generated race predictions with {}", self.primary.name());
        RaceForecast::Generated(Value::Object(predictions))
    }

    /// Primary model call and parse. Returns the raw reply with its parsed value.
    async fn primary_forecast(&self, race_data: &Value) -> Result<(String, Value), AiError> {
        let prompt = prompts::race_prediction_prompt(race_data);
        let request = GenerationRequest::json().with_temperature(self.temperature);

        let raw = retry_if(
            &self.retry,
            "race prediction",
            || self.primary.generate(&prompt, &request),
            AiError::is_transient,
        )
        .await?;

        let parsed = parse_json(self.primary.name(), &raw)?;
        Ok((raw, parsed))
    }

    /// Rate a single driver. Errors are returned to the caller, not substituted.
    pub async fn analyze_driver_performance(&self, driver_name: &str) -> Result<Value, AiError> {
        let prompt = prompts::driver_analysis_prompt(driver_name);
        let raw = self
            .primary
            .generate(&prompt, &GenerationRequest::json())
            .await
            .inspect_err(|e| error!("Error analyzing driver performance: {}", e))?;
        debug!("Driver analysis for {} received", driver_name);
        parse_json(self.primary.name(), &raw)
    }

    /// Free-form strategy recommendations for the given race conditions.
    pub async fn generate_strategy_recommendations(
        &self,
        race_conditions: &Value,
    ) -> Result<Value, AiError> {
        let prompt = prompts::strategy_prompt(race_conditions);
        let raw = self
            .primary
            .generate(&prompt, &GenerationRequest::json())
            .await
            .inspect_err(|e| error!("Error generating strategy: {}", e))?;
        parse_json(self.primary.name(), &raw)
    }
}

fn parse_json(service: &'static str, raw: &str) -> Result<Value, AiError> {
    serde_json::from_str(raw).map_err(|e| AiError::InvalidJson {
        service,
        reason: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
