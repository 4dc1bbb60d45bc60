//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for kb-chat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Gemini backend configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Knowledge base configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Session history configuration
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Days to keep rotated log files
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u64,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_retention_days() -> u64 {
    7
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            overrides: HashMap::new(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Gemini backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,
    /// Candidate models, most preferred first
    #[serde(default = "default_gemini_models")]
    pub models: Vec<String>,
    /// Upper bound on a single generation call
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_models() -> Vec<String> {
    vec![
        "gemini-2.5-flash".to_string(),
        "gemini-2.5-flash-lite".to_string(),
        "gemini-2.5-pro".to_string(),
    ]
}

fn default_gemini_timeout() -> u64 {
    60
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_gemini_api_base(),
            models: default_gemini_models(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

/// Knowledge base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path of the knowledge base JSON file
    #[serde(default = "default_knowledge_path")]
    pub path: String,
    /// Entries included in the prompt context per question
    #[serde(default = "default_max_context_entries")]
    pub max_context_entries: usize,
}

fn default_knowledge_path() -> String {
    "knowledge.json".to_string()
}

fn default_max_context_entries() -> usize {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
            max_context_entries: default_max_context_entries(),
        }
    }
}

/// Session history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Turns retained per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Most recent turns rendered into each prompt
    #[serde(default = "default_render_window")]
    pub render_window: usize,
}

fn default_max_history() -> usize {
    crate::session::DEFAULT_MAX_HISTORY
}

fn default_render_window() -> usize {
    10
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            render_window: default_render_window(),
        }
    }
}
