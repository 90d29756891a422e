//! Exchange-rate commands for CLI.

use clap::Subcommand;
use duetrack_core::{Config, RateClient};

#[derive(Subcommand)]
pub enum RatesAction {
    /// Fetch and print the rate table for a base currency
    Show {
        /// Base currency (defaults to config)
        #[arg(long)]
        base: Option<String>,
    },
}

pub fn run(action: RatesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RatesAction::Show { base } => {
            let config = Config::load_or_default();
            let base = base.unwrap_or_else(|| config.rates.base_currency.clone());
            let client = RateClient::from_config(&config.rates);

            let runtime = tokio::runtime::Runtime::new()?;
            let table = runtime.block_on(client.rates(&base))?;

            let mut pairs: Vec<_> = table.rates.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            println!("base: {}", table.base);
            for (code, rate) in pairs {
                println!("{code}  {rate}");
            }
        }
    }
    Ok(())
}
