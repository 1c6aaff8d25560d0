//! Chat completion types.

use serde::{Deserialize, Serialize};

use crate::errors::OpenRouterError;

/// Chat completion request.
///
/// Serializes to the JSON body of `POST /chat/completions`: `model`,
/// `messages`, `max_tokens`, and `stream`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model ID (required).
    pub model: String,

    /// Messages array (required).
    pub messages: Vec<Message>,

    /// Max completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Enable streaming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Creates a new request with model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            stream: None,
        }
    }

    /// Creates a new request builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::new()
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), OpenRouterError> {
        if self.model.is_empty() {
            return Err(OpenRouterError::validation("Model is required"));
        }

        if self.messages.is_empty() {
            return Err(OpenRouterError::validation(
                "At least one message is required",
            ));
        }

        Ok(())
    }
}

/// Chat request builder.
#[derive(Debug, Default)]
pub struct ChatRequestBuilder {
    model: Option<String>,
    messages: Vec<Message>,
    max_tokens: Option<u32>,
    stream: Option<bool>,
}

impl ChatRequestBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets all messages.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Adds a message.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Adds a system message.
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a user message.
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Adds an assistant message.
    pub fn assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Sets the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Enables streaming.
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Builds the request.
    pub fn build(self) -> Result<ChatRequest, OpenRouterError> {
        let model = self
            .model
            .ok_or_else(|| OpenRouterError::validation("Model is required"))?;

        let request = ChatRequest {
            model,
            messages: self.messages,
            max_tokens: self.max_tokens,
            stream: self.stream,
        };

        request.validate()?;
        Ok(request)
    }
}

/// Chat message.
///
/// An ordered role/content pair, owned by the caller and passed by value
/// into the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: Role,

    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// Chat completion response (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Response ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Model ID.
    #[serde(default)]
    pub model: Option<String>,

    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<i64>,

    /// Response choices.
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Gets the first choice content, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }

    /// Gets the finish reason from the first choice.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices.first().and_then(|c| c.finish_reason)
    }
}

/// Response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,

    /// Assistant message.
    pub message: AssistantMessage,

    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Assistant message in a response.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    /// Message role.
    #[serde(default)]
    pub role: Option<Role>,

    /// Message content.
    #[serde(default)]
    pub content: Option<String>,
}

/// Finish reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Normal completion.
    Stop,
    /// Max tokens reached.
    Length,
    /// Content filter triggered.
    ContentFilter,
    /// Unrecognized reason reported by the provider.
    #[serde(other)]
    Other,
}

/// Token usage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

/// Streaming chunk.
///
/// One decoded `data:` payload from the event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    /// Response ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Model ID.
    #[serde(default)]
    pub model: Option<String>,

    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<i64>,

    /// Chunk choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// Gets the first choice's incremental content, if any.
    pub fn delta_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }
}

/// Streaming choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,

    /// Delta content.
    #[serde(default)]
    pub delta: Delta,

    /// Finish reason (in final chunk).
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Delta content in streaming.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    /// Role (first chunk only).
    #[serde(default)]
    pub role: Option<Role>,

    /// Content delta.
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::builder()
            .model("mistralai/mistral-7b-instruct:free")
            .system("You are a helpful assistant.")
            .user("Hello!")
            .max_tokens(200)
            .build()
            .unwrap();

        assert_eq!(request.model, "mistralai/mistral-7b-instruct:free");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.max_tokens, Some(200));
        assert_eq!(request.stream, None);
    }

    #[test]
    fn test_chat_request_validation_no_model() {
        let result = ChatRequest::builder().user("Hello").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_request_validation_no_messages() {
        let result = ChatRequest::builder().model("test-model").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_message_creation() {
        let system = Message::system("You are helpful");
        assert_eq!(system.role, Role::System);

        let user = Message::user("Hello");
        assert_eq!(user.role, Role::User);

        let assistant = Message::assistant("Hi there!");
        assert_eq!(assistant.role, Role::Assistant);
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = ChatRequest::builder()
            .model("test-model")
            .user("Hi")
            .max_tokens(200)
            .stream(true)
            .build()
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hi");
        assert_eq!(json["max_tokens"], 200);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_chat_response_content() {
        let json = r#"{
            "id": "gen-123",
            "model": "mistralai/mistral-7b-instruct:free",
            "created": 1705312345,
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content(), Some("Hello!"));
        assert_eq!(response.finish_reason(), Some(FinishReason::Stop));
    }

    #[test]
    fn test_chat_response_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(response.content(), None);
    }

    #[test]
    fn test_chat_chunk_delta_content() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap();
        assert_eq!(chunk.delta_content(), Some("Hel"));
    }

    #[test]
    fn test_chat_chunk_role_only_delta() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(chunk.delta_content(), None);
    }

    #[test]
    fn test_unknown_finish_reason_tolerated() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{},"finish_reason":"error"}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].finish_reason, Some(FinishReason::Other));
    }
}
