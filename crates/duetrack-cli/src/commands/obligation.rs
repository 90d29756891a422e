//! Obligation management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use duetrack_core::{
    compute_next_due, LedgerDb, Obligation, ObligationCategory, RecurrenceUnit,
};
use uuid::Uuid;

use super::{parse_date, resolve_owner};

#[derive(Subcommand)]
pub enum ObligationAction {
    /// Create a new obligation
    Create {
        /// Display name
        name: String,
        /// Owner (defaults to configured owner)
        #[arg(long)]
        owner: Option<String>,
        /// Category: payment, legal, or other (default: payment)
        #[arg(long, default_value = "payment")]
        category: String,
        /// Amount; omit when unknown
        #[arg(long)]
        amount: Option<f64>,
        /// Currency code
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Due date (YYYY-MM-DD); anchor for recurring obligations
        #[arg(long)]
        due: Option<String>,
        /// Mark as recurring
        #[arg(long)]
        recurring: bool,
        /// Recurrence unit: week or month
        #[arg(long)]
        unit: Option<String>,
        /// Recurrence interval (every N units)
        #[arg(long)]
        interval: Option<i64>,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List obligations
    List {
        #[arg(long)]
        owner: Option<String>,
        /// Include done obligations
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get obligation details
    Get {
        /// Obligation ID
        id: String,
    },
    /// Mark an obligation done (terminal: the sweep stops rolling it)
    Done {
        /// Obligation ID
        id: String,
    },
    /// Delete an obligation
    Delete {
        /// Obligation ID
        id: String,
    },
}

pub fn run(action: ObligationAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        ObligationAction::Create {
            name,
            owner,
            category,
            amount,
            currency,
            due,
            recurring,
            unit,
            interval,
            notes,
        } => {
            let category = ObligationCategory::parse(&category)
                .ok_or_else(|| format!("invalid category '{category}'"))?;
            let unit = match unit {
                Some(u) => {
                    Some(RecurrenceUnit::parse(&u).ok_or_else(|| format!("invalid unit '{u}'"))?)
                }
                None => None,
            };
            let anchor = due.as_deref().map(parse_date).transpose()?;
            let now = Utc::now();

            let ob = Obligation {
                id: Uuid::new_v4().to_string(),
                owner_id: resolve_owner(owner),
                name,
                category,
                amount,
                currency,
                // Due dates are owned by the engine, even at creation time.
                next_due: compute_next_due(anchor, unit, interval, now),
                is_recurring: recurring,
                recurrence_unit: unit,
                recurrence_interval: interval,
                is_active: true,
                is_done: false,
                account_id: None,
                notes,
                created_at: now,
                updated_at: now,
            };
            ob.validate()?;
            db.insert_obligation(&ob)?;
            println!("Obligation created: {}", ob.id);
        }
        ObligationAction::List { owner, all, json } => {
            let obligations = db.list_obligations(&resolve_owner(owner), all)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&obligations)?);
            } else {
                for ob in obligations {
                    let due = ob
                        .next_due
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".into());
                    let recur = match (ob.recurrence_interval, ob.recurrence_unit) {
                        (Some(i), Some(u)) => format!("every {i} {u}(s)"),
                        _ => "one-time".into(),
                    };
                    println!("{}  {}  due {}  {}", ob.id, ob.name, due, recur);
                }
            }
        }
        ObligationAction::Get { id } => {
            let ob = db
                .get_obligation(&id)?
                .ok_or_else(|| format!("no obligation with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&ob)?);
        }
        ObligationAction::Done { id } => {
            db.set_done(&id)?;
            println!("Obligation done: {id}");
        }
        ObligationAction::Delete { id } => {
            db.delete_obligation(&id)?;
            println!("Obligation deleted: {id}");
        }
    }
    Ok(())
}
