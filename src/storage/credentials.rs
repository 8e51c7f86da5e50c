//! Source of model API keys.

use anyhow::Result;

use crate::config::CredentialsConfig;

/// API keys for the primary and secondary models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiCredentials {
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
}

fn non_blank(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}

impl ApiCredentials {
    /// Primary key, if set and non-blank.
    pub fn primary(&self) -> Option<&str> {
        non_blank(&self.gemini_api_key)
    }

    /// Secondary key, if set and non-blank.
    pub fn secondary(&self) -> Option<&str> {
        non_blank(&self.groq_api_key)
    }
}

/// Where request handlers and commands read credentials from.
pub trait CredentialProvider: Send + Sync {
    /// Current credentials, or `None` when nothing has been configured.
    fn credentials(&self) -> Result<Option<ApiCredentials>>;
}

/// Fixed credentials, typically taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<ApiCredentials>);

impl From<&CredentialsConfig> for StaticCredentials {
    fn from(config: &CredentialsConfig) -> Self {
        if config.gemini_api_key.is_none() && config.groq_api_key.is_none() {
            return Self(None);
        }
        Self(Some(ApiCredentials {
            gemini_api_key: config.gemini_api_key.clone(),
            groq_api_key: config.groq_api_key.clone(),
        }))
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Option<ApiCredentials>> {
        Ok(self.0.clone())
    }
}
