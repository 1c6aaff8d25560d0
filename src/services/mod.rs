//! Service layer for the OpenRouter API.

/// Chat completions service.
pub mod chat;

pub use chat::{ChatService, FALLBACK_CONTENT};
