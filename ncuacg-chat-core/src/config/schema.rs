//! Configuration schema definitions

use crate::utils::ensure_slash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the chat client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Assistant backend configuration
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Session persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,
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
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.ncuacg-chat/logs".to_string()
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

/// Assistant backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Base URL the chat and persona endpoints hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Explicit chat endpoint, overrides `<base_url>chat/`
    #[serde(default)]
    pub chat_url: Option<String>,
    /// Explicit persona listing endpoint, overrides `<base_url>personas/`
    #[serde(default)]
    pub personas_url: Option<String>,
    /// Persona used when nothing has been persisted yet (empty = server default)
    #[serde(default)]
    pub default_persona: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Switch to the first server-suggested persona when the backend rejects one
    #[serde(default = "default_true")]
    pub persona_fallback: bool,
    /// Adopt the persona reported by the backend on every reply
    #[serde(default = "default_true")]
    pub adopt_server_persona: bool,
    /// Persona catalog file (JSON or YAML); the built-in catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/assistant/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_url: None,
            personas_url: None,
            default_persona: String::new(),
            timeout_secs: default_timeout_secs(),
            persona_fallback: true,
            adopt_server_persona: true,
            catalog_path: None,
        }
    }
}

impl AssistantConfig {
    /// Resolved chat endpoint, always slash-terminated
    pub fn chat_endpoint(&self) -> String {
        self.resolve_endpoint(self.chat_url.as_deref(), "chat")
    }

    /// Resolved persona listing endpoint, always slash-terminated
    pub fn personas_endpoint(&self) -> String {
        self.resolve_endpoint(self.personas_url.as_deref(), "personas")
    }

    fn resolve_endpoint(&self, explicit: Option<&str>, suffix: &str) -> String {
        if let Some(url) = explicit.map(ensure_slash).filter(|u| !u.is_empty()) {
            return url;
        }
        let base = ensure_slash(&self.base_url);
        if base.is_empty() {
            return String::new();
        }
        ensure_slash(&format!("{}{}", base, suffix))
    }
}

/// Where session state is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per key under `storage.dir`
    #[default]
    File,
    /// Process memory only
    Memory,
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

fn default_storage_dir() -> String {
    "~/.ncuacg-chat/state".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            dir: default_storage_dir(),
        }
    }
}
