//! Base trait for generation backends

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The backend answered with an error status. The message is surfaced verbatim.
    #[error("{0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Could not initialize any Gemini model (available: {})", .0.join(", "))]
    NoAvailableModel(Vec<String>),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Metadata about a model offered by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub supported_methods: Vec<String>,
}

/// A text-in, text-out generation backend
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> ProviderResult<String>;

    /// Model used for generation
    fn model(&self) -> String;
}
