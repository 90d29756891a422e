//! Income record commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use duetrack_core::{Income, LedgerDb};
use uuid::Uuid;

use super::{parse_date, resolve_owner};

#[derive(Subcommand)]
pub enum IncomeAction {
    /// Record an income
    Add {
        /// Income source
        source: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Occurrence date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// List incomes
    List {
        #[arg(long)]
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: IncomeAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        IncomeAction::Add {
            source,
            amount,
            currency,
            date,
            owner,
        } => {
            let income = Income {
                id: Uuid::new_v4().to_string(),
                owner_id: resolve_owner(owner),
                source,
                amount,
                currency,
                occurred_at: date.as_deref().map(parse_date).transpose()?.unwrap_or_else(Utc::now),
                created_at: Utc::now(),
            };
            db.insert_income(&income)?;
            println!("Income recorded: {}", income.id);
        }
        IncomeAction::List { owner, json } => {
            let incomes = db.list_incomes(&resolve_owner(owner))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&incomes)?);
            } else {
                for i in incomes {
                    println!(
                        "{}  {}  {} {}  on {}",
                        i.id,
                        i.source,
                        i.amount,
                        i.currency,
                        i.occurred_at.format("%Y-%m-%d")
                    );
                }
            }
        }
    }
    Ok(())
}
