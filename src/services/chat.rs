//! Chat completions service.

use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::auth::AuthProvider;
use crate::config::OpenRouterConfig;
use crate::errors::{OpenRouterError, OpenRouterResult};
use crate::transport::{CompletionStream, HttpRequest, HttpTransport};
use crate::types::chat::{ChatRequest, ChatResponse, Message};

/// Placeholder returned by [`ChatService::complete`] when a response
/// carries no message content.
///
/// Degrading to a fixed string instead of failing keeps callers that
/// always expect some text (chat UIs in particular) working.
pub const FALLBACK_CONTENT: &str = "エラーが発生しました";

/// Chat completions service.
pub struct ChatService {
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    config: OpenRouterConfig,
}

impl ChatService {
    /// Creates a new chat service.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthProvider>,
        config: OpenRouterConfig,
    ) -> Self {
        Self {
            transport,
            auth,
            config,
        }
    }

    /// Requests one complete completion for the given messages.
    ///
    /// Uses the configured model and max tokens. Returns the first choice's
    /// message content, or [`FALLBACK_CONTENT`] if the response carries
    /// none.
    pub async fn complete(&self, messages: Vec<Message>) -> OpenRouterResult<String> {
        let request = self.default_request(messages)?;
        let response = self.create(request).await?;

        Ok(response
            .content()
            .map(str::to_owned)
            .unwrap_or_else(|| FALLBACK_CONTENT.to_string()))
    }

    /// Requests a streaming completion for the given messages.
    ///
    /// Uses the configured model and max tokens, and yields text fragments
    /// as they arrive.
    pub async fn stream(&self, messages: Vec<Message>) -> OpenRouterResult<CompletionStream> {
        let request = self.default_request(messages)?;
        self.create_stream(request).await
    }

    /// Creates a chat completion.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn create(&self, request: ChatRequest) -> OpenRouterResult<ChatResponse> {
        self.auth.validate()?;
        request.validate()?;

        let mut request = request;
        request.stream = Some(false);

        let http_request = self.build_request(&request, false)?;
        let response = self.transport.send(http_request).await?;

        if !response.is_success() {
            let error = OpenRouterError::server(response.status, response.body_text());
            tracing::warn!(status = response.status, "Chat completion request failed");
            return Err(error);
        }

        Ok(response.json()?)
    }

    /// Creates a streaming chat completion.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn create_stream(&self, request: ChatRequest) -> OpenRouterResult<CompletionStream> {
        self.auth.validate()?;
        request.validate()?;

        let mut request = request;
        request.stream = Some(true);

        let http_request = self.build_request(&request, true)?;
        let response = self.transport.send_streaming(http_request).await?;

        if !(200..300).contains(&response.status) {
            let status = response.status;
            let body = read_body_text(response.stream).await;
            tracing::warn!(status, "Streaming chat completion request failed");
            return Err(OpenRouterError::server(status, body));
        }

        Ok(CompletionStream::new(response))
    }

    fn default_request(&self, messages: Vec<Message>) -> OpenRouterResult<ChatRequest> {
        ChatRequest::builder()
            .model(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .build()
    }

    /// Builds an HTTP request from a chat request.
    fn build_request(
        &self,
        request: &ChatRequest,
        streaming: bool,
    ) -> OpenRouterResult<HttpRequest> {
        let body = serde_json::to_vec(request).map_err(|e| {
            OpenRouterError::validation(format!("Failed to serialize request: {}", e))
        })?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        if streaming {
            headers.insert("Accept".to_string(), "text/event-stream".to_string());
        }

        // OpenRouter app attribution headers.
        if let Some(referer) = &self.config.referer {
            headers.insert("HTTP-Referer".to_string(), referer.clone());
        }
        if let Some(title) = &self.config.app_title {
            headers.insert("X-Title".to_string(), title.clone());
        }

        self.auth.apply_auth(&mut headers);

        Ok(HttpRequest::post("chat/completions")
            .with_body(body)
            .with_headers(headers))
    }
}

/// Drains a byte stream into text, for error bodies.
async fn read_body_text(
    mut stream: std::pin::Pin<
        Box<dyn futures::Stream<Item = Result<bytes::Bytes, crate::transport::TransportError>> + Send>,
    >,
) -> String {
    let mut body = Vec::new();
    while let Some(Ok(chunk)) = stream.next().await {
        body.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&body).into_owned()
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("config", &self.config)
            .finish()
    }
}
