//! Error types for the OpenRouter client.
//!
//! Covers the failure modes that abort a call: configuration problems,
//! non-success API responses, network failures, and broken streams.
//! Per-line decode failures inside a streaming response are deliberately
//! not represented here; they are logged and skipped without ending the
//! stream.

use thiserror::Error;

/// Result type alias for OpenRouter operations.
pub type OpenRouterResult<T> = Result<T, OpenRouterError>;

/// Error type for OpenRouter client operations.
#[derive(Debug, Error)]
pub enum OpenRouterError {
    /// Configuration error (missing API key, invalid base URL, etc.)
    /// Surfaced before any network activity.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Validation error (request validation failed).
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation issue.
        message: String,
    },

    /// Non-success HTTP status on the initial response.
    #[error("Server error (HTTP {status_code}): {body}")]
    Server {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body text.
        body: String,
    },

    /// Network/connection error.
    #[error("Network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Request timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// Streaming error: the response carried no readable body, or the
    /// transport failed mid-stream.
    #[error("Stream error: {message}")]
    Stream {
        /// Error message.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl OpenRouterError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        OpenRouterError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        OpenRouterError::Validation {
            message: message.into(),
        }
    }

    /// Creates a server error from a status code and response body.
    pub fn server(status_code: u16, body: impl Into<String>) -> Self {
        OpenRouterError::Server {
            status_code,
            body: body.into(),
        }
    }

    /// Creates a stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        OpenRouterError::Stream {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code if this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OpenRouterError::Server { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OpenRouterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OpenRouterError::Timeout {
                message: err.to_string(),
            }
        } else {
            OpenRouterError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for OpenRouterError {
    fn from(err: serde_json::Error) -> Self {
        OpenRouterError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for OpenRouterError {
    fn from(err: url::ParseError) -> Self {
        OpenRouterError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}

impl From<crate::transport::TransportError> for OpenRouterError {
    fn from(err: crate::transport::TransportError) -> Self {
        match err {
            crate::transport::TransportError::Timeout { .. } => OpenRouterError::Timeout {
                message: err.to_string(),
            },
            _ => OpenRouterError::Network {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_carries_status_and_body() {
        let error = OpenRouterError::server(401, "unauthorized");

        assert_eq!(error.status_code(), Some(401));
        if let OpenRouterError::Server { status_code, body } = error {
            assert_eq!(status_code, 401);
            assert_eq!(body, "unauthorized");
        } else {
            panic!("Expected Server error");
        }
    }

    #[test]
    fn test_configuration_error_has_no_status() {
        let error = OpenRouterError::configuration("API key is required");
        assert_eq!(error.status_code(), None);
    }

    #[test]
    fn test_error_display() {
        let error = OpenRouterError::server(500, "internal error");
        assert_eq!(
            error.to_string(),
            "Server error (HTTP 500): internal error"
        );
    }
}
