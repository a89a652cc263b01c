//! Layered configuration loading
//!
//! Layers, lowest first: built-in defaults, `config.json`, the short env
//! aliases in [`ENV_ALIASES`], then `NCUACG_CHAT__SECTION__KEY` paths.

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for `NCUACG_CHAT__SECTION__KEY=value` overrides
const ENV_PREFIX: &str = "NCUACG_CHAT__";

const CONFIG_FILE: &str = "config.json";

/// Deployment-style variables and the setting each one feeds
pub const ENV_ALIASES: [(&str, &str); 4] = [
    ("ASSISTANT_BASE_URL", "assistant.base_url"),
    ("ASSISTANT_CHAT_URL", "assistant.chat_url"),
    ("ASSISTANT_PERSONAS_URL", "assistant.personas_url"),
    ("DEFAULT_PERSONA", "assistant.default_persona"),
];

/// Reads and writes `config.json` in a client config directory
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader for `~/.ncuacg-chat`
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".ncuacg-chat"))
            .unwrap_or_else(|| PathBuf::from(".ncuacg-chat"));
        Self { config_dir }
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Resolve every layer and validate the result
    pub fn load(&self) -> crate::Result<Config> {
        let mut layered = serde_json::to_value(Config::default())?;

        if let Some(file_layer) = self.read_file_layer()? {
            overlay(&mut layered, file_layer);
        }
        for (path, value) in env_overrides(std::env::vars()) {
            debug!("Config override from environment: {}", path.join("."));
            assign(&mut layered, &path, value);
        }

        let config: Config = serde_json::from_value(layered)?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::write(self.config_path(), serde_json::to_string_pretty(config)?)?;
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn read_file_layer(&self) -> crate::Result<Option<Value>> {
        let path = self.config_path();
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content).map_err(|e| {
                crate::Error::Config(format!("{}: {}", path.display(), e))
            })?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively lay `upper` over `lower`; non-object values replace wholesale
fn overlay(lower: &mut Value, upper: Value) {
    match (lower, upper) {
        (Value::Object(lower), Value::Object(upper)) => {
            for (key, value) in upper {
                match lower.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        lower.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Overrides in application order: aliases first, so explicit paths win
fn env_overrides(vars: impl Iterator<Item = (String, String)>) -> Vec<(Vec<String>, Value)> {
    let vars: Vec<(String, String)> = vars.collect();
    let mut overrides = Vec::new();

    for (alias, target) in ENV_ALIASES {
        if let Some((_, raw)) = vars.iter().find(|(key, _)| key == alias) {
            let path = target.split('.').map(str::to_string).collect();
            overrides.push((path, Value::String(raw.clone())));
        }
    }

    for (key, raw) in &vars {
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = rest
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if !path.is_empty() {
            overrides.push((path, typed_env_value(raw)));
        }
    }

    overrides
}

/// JSON literals keep their type (`45`, `false`, `["a"]`); anything else is a string
fn typed_env_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    })
}

/// Write `value` at `path`, turning scalars on the way into objects
fn assign(root: &mut Value, path: &[String], value: Value) {
    let Some((key, rest)) = path.split_first() else {
        *root = value;
        return;
    };
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let Value::Object(map) = root else {
        return;
    };
    if rest.is_empty() {
        map.insert(key.clone(), value);
    } else {
        let child = map.entry(key.clone()).or_insert(Value::Null);
        assign(child, rest, value);
    }
}
