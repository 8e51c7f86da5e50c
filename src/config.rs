//! Configuration for the F1 Forecast service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/f1_forecast.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Ergast stats API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErgastConfig {
    #[serde(default = "default_ergast_url")]
    pub base_url: String,
    /// Timeout for ordinary lookups
    #[serde(default = "default_ergast_timeout")]
    pub timeout_secs: u64,
    /// Timeout for the large career / lap time queries
    #[serde(default = "default_ergast_long_timeout")]
    pub long_timeout_secs: u64,
}

fn default_ergast_url() -> String {
    "http://ergast.com/api/f1".to_string()
}

fn default_ergast_timeout() -> u64 {
    10
}

fn default_ergast_long_timeout() -> u64 {
    15
}

impl Default for ErgastConfig {
    fn default() -> Self {
        Self {
            base_url: default_ergast_url(),
            timeout_secs: default_ergast_timeout(),
            long_timeout_secs: default_ergast_long_timeout(),
        }
    }
}

impl ErgastConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }
}

/// Gemini (primary model) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_ai_timeout() -> u64 {
    30
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

/// Groq (secondary model) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    #[serde(default = "default_groq_url")]
    pub base_url: String,
    #[serde(default = "default_groq_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_groq_url() -> String {
    "https://api.groq.com".to_string()
}

fn default_groq_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: default_groq_url(),
            model: default_groq_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

/// Retry configuration for the primary model call.
///
/// `max_retries = 0` keeps the single-shot behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Credentials for CLI commands. The server reads keys from the settings store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ergast: ErgastConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = ::config::Config::builder()
            // Start with defaults
            .add_source(::config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(::config::File::with_name("config").required(false))
            // Override with environment variables (F1FORECAST_SERVER__PORT, etc.)
            .add_source(
                ::config::Environment::with_prefix("F1FORECAST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
