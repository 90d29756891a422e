//! Horizon view commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use duetrack_core::{build_horizon, HorizonItem, LedgerDb};

use super::resolve_owner;

#[derive(Subcommand)]
pub enum HorizonAction {
    /// Show the week/month/year horizon
    Show {
        #[arg(long)]
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HorizonAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        HorizonAction::Show { owner, json } => {
            let owner = resolve_owner(owner);
            let obligations = db.list_obligations(&owner, false)?;
            let reminders = db.list_reminders(&owner)?;
            let incomes = db.list_incomes(&owner)?;
            let horizon = build_horizon(&obligations, &reminders, &incomes, Utc::now());

            if json {
                println!("{}", serde_json::to_string_pretty(&horizon)?);
            } else {
                print_bucket("This week", &horizon.week);
                print_bucket("This month", &horizon.month);
                print_bucket("This year", &horizon.year);
            }
        }
    }
    Ok(())
}

fn print_bucket(label: &str, items: &[HorizonItem]) {
    println!("{label} ({}):", items.len());
    for item in items {
        println!(
            "  [{}] {}  in {} day(s)  ({})",
            item.kind.as_str(),
            item.title,
            item.days_left,
            item.due_date.format("%Y-%m-%d")
        );
    }
}
