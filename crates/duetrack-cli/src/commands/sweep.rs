//! Due-date sweep commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use duetrack_core::{run_sweep, server, Config, LedgerDb};

#[derive(Subcommand)]
pub enum SweepAction {
    /// Run one sweep now and print the report
    Run,
    /// Serve the HTTP sweep trigger for a scheduler to hit
    Serve {
        /// Bind address (defaults to config)
        #[arg(long)]
        bind: Option<String>,
        /// Port (defaults to config)
        #[arg(long)]
        port: Option<u16>,
    },
}

pub fn run(action: SweepAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        SweepAction::Run => {
            let report = run_sweep(&db, Utc::now())?;
            println!("{}", serde_json::to_string(&report)?);
        }
        SweepAction::Serve { bind, port } => {
            let config = Config::load_or_default();
            let bind = bind.unwrap_or(config.sweep.bind);
            let port = port.unwrap_or(config.sweep.port);
            server::serve(&db, &bind, port)?;
        }
    }
    Ok(())
}
