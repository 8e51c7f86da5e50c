//! Typed failure kinds for the upstream HTTP APIs.

use thiserror::Error;

/// Failure talking to the stats API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("response from {url} is missing {path}")]
    MissingPath { url: String, path: &'static str },
}

impl UpstreamError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            Self::Malformed {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Failure calling a generative model.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured for {0}")]
    MissingCredential(&'static str),
    #[error("{service} request timed out")]
    Timeout { service: &'static str },
    #[error("{service} request failed: {reason}")]
    Network {
        service: &'static str,
        reason: String,
    },
    #[error("{service} API error: HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} returned an empty reply")]
    EmptyReply { service: &'static str },
    #[error("could not parse {service} reply as JSON: {reason}")]
    InvalidJson {
        service: &'static str,
        reason: String,
    },
}

impl AiError {
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { service }
        } else {
            Self::Network {
                service,
                reason: err.to_string(),
            }
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Timeout { .. } | AiError::Network { .. } => true,
            AiError::Status { status, .. } => *status == 429 || *status >= 500,
            AiError::MissingCredential(_)
            | AiError::EmptyReply { .. }
            | AiError::InvalidJson { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AiError::Timeout { service: "gemini" }.is_transient());
        assert!(AiError::Status {
            service: "gemini",
            status: 503
        }
        .is_transient());
        assert!(AiError::Status {
            service: "gemini",
            status: 429
        }
        .is_transient());
        assert!(!AiError::Status {
            service: "gemini",
            status: 401
        }
        .is_transient());
        assert!(!AiError::InvalidJson {
            service: "gemini",
            reason: "eof".into()
        }
        .is_transient());
        assert!(!AiError::EmptyReply { service: "gemini" }.is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = UpstreamError::Status {
            url: "http://example.test/2024.json".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "http://example.test/2024.json returned HTTP 503");
    }
}
