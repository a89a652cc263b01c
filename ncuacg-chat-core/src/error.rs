//! Error types for the chat client core
//!
//! Session code never surfaces these to users; they reach the CLI only
//! through configuration and catalog loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more configuration problems, joined with `; `
    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or YAML that could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A key-value store refused an operation
    #[error("Storage error on '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn storage(key: &str, reason: impl ToString) -> Self {
        Error::Storage {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(format!("yaml: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_names_key() {
        let err = Error::storage("ncuacg.messages", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "Storage error on 'ncuacg.messages': quota exceeded"
        );
    }

    #[test]
    fn test_yaml_errors_are_tagged() {
        let err: Error = serde_yaml::from_str::<Vec<String>>("{ nope").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(ref m) if m.starts_with("yaml:")));
    }
}
