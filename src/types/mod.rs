//! Type definitions for the OpenRouter client.

/// Chat completion types.
pub mod chat;
