//! OpenRouter API client.
//!
//! Provides the main client interface for interacting with the OpenRouter
//! chat completions API.

use std::sync::Arc;

use crate::auth::{ApiKeyAuth, AuthProvider};
use crate::config::{OpenRouterConfig, OpenRouterConfigBuilder};
use crate::errors::OpenRouterResult;
use crate::services::ChatService;
use crate::transport::{HttpTransport, HttpTransportImpl};

/// The main OpenRouter client.
///
/// # Example
///
/// ```rust,no_run
/// use openrouter_client::{Message, OpenRouterClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = OpenRouterClient::builder()
///         .api_key("sk-or-your-api-key")
///         .build()?;
///
///     let reply = client
///         .chat()
///         .complete(vec![Message::user("Hello!")])
///         .await?;
///     println!("{}", reply);
///     Ok(())
/// }
/// ```
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    chat_service: ChatService,
}

impl OpenRouterClient {
    /// Creates a new client builder.
    pub fn builder() -> OpenRouterClientBuilder {
        OpenRouterClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `OPENROUTER_API_KEY` and optionally `OPENROUTER_BASE_URL`,
    /// `OPENROUTER_MODEL`, and `OPENROUTER_TIMEOUT`.
    pub fn from_env() -> OpenRouterResult<Self> {
        let config = OpenRouterConfig::from_env()?;
        OpenRouterClientBuilder::from_config(config).build()
    }

    /// Creates a client from an API key.
    pub fn from_api_key(api_key: impl Into<String>) -> OpenRouterResult<Self> {
        OpenRouterClientBuilder::new().api_key(api_key).build()
    }

    /// Returns the chat service.
    pub fn chat(&self) -> &ChatService {
        &self.chat_service
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the OpenRouter client.
pub struct OpenRouterClientBuilder {
    config_builder: OpenRouterConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl OpenRouterClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: OpenRouterConfigBuilder::new(),
            transport: None,
            auth: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: OpenRouterConfig) -> Self {
        let mut config_builder = OpenRouterConfigBuilder::new()
            .api_key(config.api_key())
            .base_url(&config.base_url)
            .model(&config.model)
            .max_tokens(config.max_tokens)
            .timeout(config.timeout);

        if let Some(referer) = &config.referer {
            config_builder = config_builder.referer(referer);
        }
        if let Some(title) = &config.app_title {
            config_builder = config_builder.app_title(title);
        }

        Self {
            config_builder,
            transport: None,
            auth: None,
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the API key from an environment variable.
    pub fn api_key_from_env(mut self, var_name: &str) -> OpenRouterResult<Self> {
        self.config_builder = self.config_builder.api_key_from_env(var_name)?;
        Ok(self)
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.model(model);
        self
    }

    /// Sets the default max completion tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config_builder = self.config_builder.max_tokens(max_tokens);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the app URL for the `HTTP-Referer` attribution header.
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.referer(referer);
        self
    }

    /// Sets the app name for the `X-Title` attribution header.
    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.app_title(title);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builds the client.
    ///
    /// Fails without any network activity if the configuration is invalid,
    /// in particular when the API key is missing or empty.
    pub fn build(self) -> OpenRouterResult<OpenRouterClient> {
        let config = self.config_builder.build()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                HttpTransportImpl::new(&config.base_url, config.timeout).map_err(|e| {
                    crate::errors::OpenRouterError::Configuration {
                        message: e.to_string(),
                    }
                })?,
            ),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(a) => a,
            None => Arc::new(ApiKeyAuth::from_string(config.api_key())),
        };

        let chat_service = ChatService::new(Arc::clone(&transport), auth, config.clone());

        Ok(OpenRouterClient {
            config,
            chat_service,
        })
    }
}

impl Default for OpenRouterClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_api_key() {
        let result = OpenRouterClientBuilder::new().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_empty_api_key() {
        let result = OpenRouterClientBuilder::new().api_key("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_with_api_key() {
        let client = OpenRouterClientBuilder::new()
            .api_key("sk-or-test-key-12345")
            .build()
            .unwrap();

        assert_eq!(client.config().base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_from_api_key() {
        let client = OpenRouterClient::from_api_key("sk-or-test-key").unwrap();
        assert_eq!(client.config().api_key_hint(), "...-key");
    }
}
