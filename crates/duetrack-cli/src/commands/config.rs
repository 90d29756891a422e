//! Configuration commands for CLI.

use clap::Subcommand;
use duetrack_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration as TOML
    Show,
    /// Get a value by dotted key, e.g. sweep.port
    Get {
        /// Config key
        key: String,
    },
    /// Set a value by dotted key
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            println!("{}", config.get_by_path(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set_by_path(&key, &value)?;
            config.save()?;
            println!("config updated");
        }
    }
    Ok(())
}
