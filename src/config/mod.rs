//! Configuration module for the OpenRouter client.
//!
//! Provides configuration management including API keys, base URLs,
//! model selection, timeouts, and app attribution headers.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::errors::{OpenRouterError, OpenRouterResult};

/// Default base URL for the OpenRouter API.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model for chat completions.
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct:free";

/// Default max completion tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// Default request timeout (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the OpenRouter client.
#[derive(Clone)]
pub struct OpenRouterConfig {
    /// API key for authentication (stored securely).
    pub(crate) api_key: SecretString,
    /// Base URL for API requests.
    pub base_url: String,
    /// Default model for chat completions.
    pub model: String,
    /// Default max completion tokens.
    pub max_tokens: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// App URL sent as the `HTTP-Referer` attribution header.
    pub referer: Option<String>,
    /// App name sent as the `X-Title` attribution header.
    pub app_title: Option<String>,
}

impl OpenRouterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OpenRouterConfigBuilder {
        OpenRouterConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENROUTER_API_KEY` (required): API key for authentication
    /// - `OPENROUTER_BASE_URL` (optional): Custom base URL
    /// - `OPENROUTER_MODEL` (optional): Default model
    /// - `OPENROUTER_TIMEOUT` (optional): Request timeout in seconds
    pub fn from_env() -> OpenRouterResult<Self> {
        let api_key =
            std::env::var("OPENROUTER_API_KEY").map_err(|_| OpenRouterError::Configuration {
                message: "OPENROUTER_API_KEY environment variable not set".to_string(),
            })?;

        let mut builder = OpenRouterConfigBuilder::new().api_key(api_key);

        if let Ok(base_url) = std::env::var("OPENROUTER_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Ok(model) = std::env::var("OPENROUTER_MODEL") {
            builder = builder.model(model);
        }

        if let Ok(timeout_str) = std::env::var("OPENROUTER_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        builder.build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        let key = self.api_key.expose_secret();
        if key.len() > 4 {
            format!("...{}", &key[key.len() - 4..])
        } else {
            "****".to_string()
        }
    }

    /// Returns the full URL for an endpoint.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("referer", &self.referer)
            .field("app_title", &self.app_title)
            .finish()
    }
}

/// Builder for `OpenRouterConfig`.
#[derive(Default)]
pub struct OpenRouterConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    referer: Option<String>,
    app_title: Option<String>,
}

impl OpenRouterConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the API key from an environment variable.
    pub fn api_key_from_env(mut self, var_name: &str) -> OpenRouterResult<Self> {
        let api_key = std::env::var(var_name).map_err(|_| OpenRouterError::Configuration {
            message: format!("Environment variable {} not set", var_name),
        })?;
        self.api_key = Some(api_key);
        Ok(self)
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the default max completion tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Sets the app URL for the `HTTP-Referer` attribution header.
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Sets the app name for the `X-Title` attribution header.
    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.app_title = Some(title.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OpenRouterResult<OpenRouterConfig> {
        let api_key = self.api_key.ok_or_else(|| OpenRouterError::Configuration {
            message: "API key is required".to_string(),
        })?;

        if api_key.is_empty() {
            return Err(OpenRouterError::Configuration {
                message: "API key cannot be empty".to_string(),
            });
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(OpenRouterError::Configuration {
                message: "Base URL must be an http(s) URL".to_string(),
            });
        }

        Ok(OpenRouterConfig {
            api_key: SecretString::new(api_key),
            base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            referer: self.referer,
            app_title: self.app_title,
        })
    }
}
