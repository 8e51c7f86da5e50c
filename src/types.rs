//! Response bodies shared by the HTTP handlers.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// API error response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query for the lap times endpoint
#[derive(Debug, Deserialize)]
pub struct LapQuery {
    pub lap: Option<u32>,
}

/// Settings form submitted from the settings page
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default)]
    pub groq_api_key: String,
}
