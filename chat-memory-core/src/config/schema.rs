//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for chat-memory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Session settings
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Model settings
    #[serde(default)]
    pub model: ModelConfig,
    /// Summarizer settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,
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

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Conversation memory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of recent exchanges handed to the model
    #[serde(default = "default_window_exchanges")]
    pub window_exchanges: usize,
}

fn default_window_exchanges() -> usize {
    3
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_exchanges: default_window_exchanges(),
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Session selected when none is given
    #[serde(default = "default_session")]
    pub default_session: String,
}

fn default_session() -> String {
    "1".to_string()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            default_session: default_session(),
        }
    }
}

/// Model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,
    /// Models offered for selection
    #[serde(default = "default_available_models")]
    pub available: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub api_key: String,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_available_models() -> Vec<String> {
    vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()]
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            available: default_available_models(),
            temperature: default_temperature(),
            api_key: String::new(),
        }
    }
}

/// Summarizer settings, lengths counted in words
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
    /// Upper bound for the combined partial summaries of one reduce step
    #[serde(default = "default_token_max")]
    pub token_max: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_token_max() -> usize {
    4000
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            token_max: default_token_max(),
        }
    }
}
