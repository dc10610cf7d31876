//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CHAT_MEMORY__";

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".chat-memory"))
            .unwrap_or_else(|| PathBuf::from(".chat-memory"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and environment
    ///
    /// Precedence, lowest first: defaults, `config.json`, `OPENAI_API_KEY`,
    /// `CHAT_MEMORY__SECTION__KEY` variables.
    pub fn load(&self) -> crate::Result<Config> {
        let config_path = self.config_dir.join("config.json");
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_into(&mut merged, file_value);
        }

        for (path, value) in env_overrides() {
            merge_into(&mut merged, nest(&path, value));
        }

        let config: Config = serde_json::from_value(merged)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let config_path = self.config_dir.join("config.json");
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Variables that set a config path under a conventional name
const ENV_ALIASES: [(&str, &str); 1] = [("OPENAI_API_KEY", "model.api_key")];

/// Deep-merge `overlay` into `base`: objects merge key by key, anything else
/// replaces the base value
fn merge_into(base: &mut Value, overlay: Value) {
    let Value::Object(entries) = overlay else {
        *base = overlay;
        return;
    };
    let Some(target) = base.as_object_mut() else {
        *base = Value::Object(entries);
        return;
    };
    for (key, value) in entries {
        match target.get_mut(&key) {
            Some(slot) => merge_into(slot, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Wrap `value` in one object per path segment, outermost first
fn nest(path: &[String], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert(key.clone(), inner);
        Value::Object(map)
    })
}

/// Read an env value as JSON when it parses, otherwise as a bool or string
fn parse_env_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    })
}

/// Config paths set from the environment, lowest precedence first.
///
/// Aliases come before `CHAT_MEMORY__SECTION__KEY` variables so the scoped
/// form wins when both name the same path.
fn env_overrides() -> Vec<(Vec<String>, Value)> {
    let aliases = ENV_ALIASES.iter().filter_map(|(var, path)| {
        let raw = std::env::var(var).ok()?;
        let path = path.split('.').map(str::to_string).collect();
        Some((path, Value::String(raw)))
    });

    let mut scoped: Vec<(Vec<String>, Value)> = std::env::vars()
        .filter_map(|(key, raw)| {
            let path: Vec<String> = key
                .strip_prefix(ENV_PREFIX)?
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(str::to_ascii_lowercase)
                .collect();
            (!path.is_empty()).then(|| (path, parse_env_value(&raw)))
        })
        .collect();
    scoped.sort_by(|a, b| a.0.cmp(&b.0));

    aliases.chain(scoped).collect()
}
