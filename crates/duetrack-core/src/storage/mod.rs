mod config;
pub mod ledger_db;
pub mod migrations;

pub use config::{Config, DatabaseConfig, RatesConfig, SweepConfig};
pub use ledger_db::LedgerDb;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/duetrack[-dev]/` based on DUETRACK_ENV.
///
/// Set DUETRACK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DUETRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("duetrack-dev")
    } else {
        base_dir.join("duetrack")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;

    Ok(dir)
}
