//! Generation backends for kb-chat
//!
//! This crate provides the backend abstraction used by the chat agent and
//! the Google Gemini implementation.

pub mod base;
pub mod gemini;

pub use base::{LLMProvider, ModelInfo, ProviderError, ProviderResult};
pub use gemini::{select_model, GeminiClient};
