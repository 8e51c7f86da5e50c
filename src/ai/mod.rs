//! Generative-model clients and the race predictor built on them.

pub mod fallback;
pub mod gemini;
pub mod groq;
pub mod predictor;
pub mod prompts;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::AppConfig;
use crate::error::AiError;
use crate::retry::RetryConfig;
use crate::storage::ApiCredentials;

pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use predictor::{RaceForecast, RacePredictor};

/// Options for a single generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    /// Ask the model for a JSON document instead of free text
    pub json_reply: bool,
    /// Sampling temperature; `None` leaves the model default
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn json() -> Self {
        Self {
            json_reply: true,
            temperature: None,
        }
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A text generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Service name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Send one prompt and return the raw reply text.
    async fn generate(&self, prompt: &str, request: &GenerationRequest) -> Result<String, AiError>;
}

/// Builds predictors for the credentials in effect at request time.
#[derive(Clone)]
pub struct ModelFactory {
    http: Client,
    config: AppConfig,
}

impl ModelFactory {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("f1-forecast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Predictor using the primary key and, when present, the secondary one.
    pub fn predictor(&self, credentials: &ApiCredentials) -> Result<RacePredictor, AiError> {
        let primary_key = credentials
            .primary()
            .ok_or(AiError::MissingCredential("gemini"))?;

        let primary = GeminiClient::new(self.http.clone(), &self.config.gemini, primary_key);
        let secondary = credentials.secondary().map(|key| {
            Box::new(GroqClient::new(self.http.clone(), &self.config.groq, key))
                as Box<dyn LanguageModel>
        });

        Ok(RacePredictor::new(Box::new(primary), secondary)
            .with_temperature(self.config.gemini.temperature)
            .with_retry(RetryConfig::from(&self.config.retry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_requires_primary_key() {
        let factory = ModelFactory::new(&AppConfig::default()).unwrap();
        let creds = ApiCredentials {
            gemini_api_key: Some("   ".into()),
            groq_api_key: Some("gsk_test".into()),
        };
        assert!(matches!(
            factory.predictor(&creds),
            Err(AiError::MissingCredential("gemini"))
        ));
    }

    #[test]
    fn test_factory_secondary_is_optional() {
        let factory = ModelFactory::new(&AppConfig::default()).unwrap();
        let creds = ApiCredentials {
            gemini_api_key: Some("AIza-test".into()),
            groq_api_key: None,
        };
        let predictor = factory.predictor(&creds).unwrap();
        assert!(!predictor.has_secondary());
    }

    #[test]
    fn test_generation_request_builders() {
        let req = GenerationRequest::json().with_temperature(0.7);
        assert!(req.json_reply);
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(GenerationRequest::text(), GenerationRequest::default());
    }
}
