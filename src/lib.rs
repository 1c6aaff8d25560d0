//! OpenRouter AI Client Library
//!
//! A production-ready Rust client for the OpenRouter chat completions API.
//! Provides one-shot completions and incremental streaming with a decoder
//! that is independent of how the transport chunks the response bytes.
//!
//! # Features
//!
//! - **Chat Completions**: Sync and streaming over a single endpoint
//! - **Robust Stream Decoding**: Line framing with carry-over buffering, so
//!   payloads split across network reads are never corrupted
//! - **Graceful Degradation**: Malformed stream payloads are skipped, not
//!   fatal; one-shot responses without content fall back to a placeholder
//! - **Secure Credentials**: API keys held in [`secrecy`] types, redacted
//!   from debug output
//! - **Async/Await**: Built on Tokio and reqwest
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use openrouter_client::{Message, OpenRouterClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenRouterClient::builder()
//!         .api_key("sk-or-your-api-key")
//!         .build()?;
//!
//!     let reply = client
//!         .chat()
//!         .complete(vec![Message::user("Hello, OpenRouter!")])
//!         .await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! # Streaming Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use openrouter_client::{Message, OpenRouterClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenRouterClient::builder()
//!         .api_key("sk-or-your-api-key")
//!         .build()?;
//!
//!     let mut stream = client
//!         .chat()
//!         .stream(vec![Message::user("Tell me a story")])
//!         .await?;
//!
//!     while let Some(fragment) = stream.next().await {
//!         print!("{}", fragment?);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{OpenRouterClient, OpenRouterClientBuilder};
pub use config::OpenRouterConfig;
pub use errors::{OpenRouterError, OpenRouterResult};
pub use services::{ChatService, FALLBACK_CONTENT};
pub use transport::CompletionStream;

// Type re-exports
pub use types::chat::{
    AssistantMessage, ChatChunk, ChatRequest, ChatResponse, Choice, ChunkChoice, Delta,
    FinishReason, Message, Role, Usage,
};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
