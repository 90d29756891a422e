//! TOML-based application configuration.
//!
//! Stores:
//! - Database location override
//! - Sweep trigger server bind address and port
//! - Exchange-rate endpoint and cache TTL
//!
//! Configuration is stored at `~/.config/duetrack/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Database file path. Defaults to `<data_dir>/duetrack.db` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Sweep trigger server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_sweep_port")]
    pub port: u16,
}

/// Exchange-rate client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    #[serde(default = "default_rates_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Cached rate tables are reused for this long before refetching.
    #[serde(default = "default_rates_ttl")]
    pub cache_ttl_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/duetrack/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Owner recorded on records created without an explicit `--owner`.
    /// Kept before the sections so the TOML serializer emits it at the top.
    #[serde(default = "default_owner")]
    pub default_owner: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub rates: RatesConfig,
}

// Default functions
fn default_bind() -> String {
    "127.0.0.1".into()
}
fn default_sweep_port() -> u16 {
    7878
}
fn default_rates_endpoint() -> String {
    "https://open.er-api.com/v6/latest".into()
}
fn default_base_currency() -> String {
    "USD".into()
}
fn default_rates_ttl() -> u64 {
    3600
}
fn default_owner() -> String {
    "default".into()
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_sweep_port(),
        }
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rates_endpoint(),
            base_currency: default_base_currency(),
            cache_ttl_secs: default_rates_ttl(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
            database: DatabaseConfig::default(),
            sweep: SweepConfig::default(),
            rates: RatesConfig::default(),
        }
    }
}

impl Config {
    /// Path to the configuration file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Load the configuration from disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config = toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(config)
    }

    /// Save the configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Read a value by dotted key path, e.g. `sweep.port`.
    pub fn get_by_path(&self, key: &str) -> Result<serde_json::Value> {
        let root = serde_json::to_value(self)?;
        let mut current = &root;
        for part in key.split('.') {
            current = current.get(part).ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: "unknown config key".into(),
            })?;
        }
        Ok(current.clone())
    }

    /// Set a value by dotted key path, coercing to the existing leaf type.
    pub fn set_by_path(&mut self, key: &str, value: &str) -> Result<()> {
        let mut root = serde_json::to_value(&*self)?;
        let unknown_key = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };

        // Walk to the parent object, then replace the leaf.
        let mut parts: Vec<&str> = key.split('.').collect();
        let leaf = parts.pop().unwrap_or_default();

        let mut current = &mut root;
        for part in parts {
            current = current.get_mut(part).ok_or_else(unknown_key)?;
        }
        let obj = current.as_object_mut().ok_or_else(unknown_key)?;
        let existing = obj.get(leaf).ok_or_else(unknown_key)?;
        let new_value =
            coerce_like(existing, value).map_err(|message| ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })?;
        obj.insert(leaf.to_string(), new_value);

        *self = serde_json::from_value(root)?;
        Ok(())
    }
}

/// Parse `value` into the same JSON type as `existing`.
fn coerce_like(existing: &serde_json::Value, value: &str) -> Result<serde_json::Value, String> {
    match existing {
        serde_json::Value::Bool(_) => value
            .parse::<bool>()
            .map(serde_json::Value::Bool)
            .map_err(|_| format!("cannot parse '{value}' as bool")),
        serde_json::Value::Number(_) => {
            if let Ok(n) = value.parse::<u64>() {
                Ok(serde_json::Value::Number(n.into()))
            } else if let Ok(n) = value.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| format!("cannot parse '{value}' as number"))
            } else {
                Err(format!("cannot parse '{value}' as number"))
            }
        }
        _ => Ok(serde_json::Value::String(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.sweep.port, 7878);
        assert_eq!(config.rates.cache_ttl_secs, 3600);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn toml_round_trip_with_missing_sections() {
        // Missing sections fall back to defaults.
        let config: Config = toml::from_str("default_owner = \"kira\"").unwrap();
        assert_eq!(config.default_owner, "kira");
        assert_eq!(config.sweep.bind, "127.0.0.1");

        let raw = toml::to_string_pretty(&config).unwrap();
        let decoded: Config = toml::from_str(&raw).unwrap();
        assert_eq!(decoded.default_owner, "kira");
        assert_eq!(decoded.rates.base_currency, "USD");
    }

    #[test]
    fn get_and_set_by_path() {
        let mut config = Config::default();
        config.set_by_path("sweep.port", "9000").unwrap();
        assert_eq!(config.sweep.port, 9000);
        assert_eq!(
            config.get_by_path("sweep.port").unwrap(),
            serde_json::json!(9000)
        );

        config.set_by_path("rates.base_currency", "EUR").unwrap();
        assert_eq!(config.rates.base_currency, "EUR");

        // Top-level keys work too.
        config.set_by_path("default_owner", "kira").unwrap();
        assert_eq!(config.default_owner, "kira");

        assert!(config.set_by_path("sweep.nope", "1").is_err());
        assert!(config.set_by_path("nope.port", "1").is_err());
        assert!(config.set_by_path("sweep.port", "not-a-number").is_err());
        assert!(config.set_by_path("", "x").is_err());
    }
}
