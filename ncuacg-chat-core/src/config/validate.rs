//! Configuration validation rules.

use super::schema::{Config, StorageBackend};

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();
    let assistant = &config.assistant;

    let chat_endpoint = assistant.chat_endpoint();
    if chat_endpoint.is_empty() {
        errors.push("assistant.base_url or assistant.chat_url must be set".to_string());
    } else if !is_http_url(&chat_endpoint) {
        errors.push(format!(
            "assistant chat endpoint must be an http(s) URL, got '{}'",
            chat_endpoint
        ));
    }
    if let Some(url) = assistant.personas_url.as_deref() {
        if !url.trim().is_empty() && !is_http_url(url.trim()) {
            errors.push(format!(
                "assistant.personas_url must be an http(s) URL, got '{}'",
                url
            ));
        }
    }
    if assistant.timeout_secs == 0 {
        errors.push("assistant.timeout_secs must be > 0".to_string());
    }
    if let Some(path) = assistant.catalog_path.as_deref() {
        if path.trim().is_empty() {
            errors.push("assistant.catalog_path must not be blank when set".to_string());
        }
    }

    if config.storage.backend == StorageBackend::File && config.storage.dir.trim().is_empty() {
        errors.push("storage.dir is required when storage.backend is file".to_string());
    }

    if !matches!(config.logging.format.to_lowercase().as_str(), "text" | "json") {
        errors.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
