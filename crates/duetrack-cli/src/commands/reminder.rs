//! Reminder commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use duetrack_core::{LedgerDb, Reminder};
use uuid::Uuid;

use super::{parse_date, resolve_owner};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder
    Add {
        /// Reminder title
        title: String,
        /// Due date/time (YYYY-MM-DD or RFC3339)
        #[arg(long)]
        due: String,
        #[arg(long)]
        owner: Option<String>,
        /// Flag as important
        #[arg(long)]
        important: bool,
        /// Cross-reference an obligation
        #[arg(long)]
        obligation_id: Option<String>,
    },
    /// List reminders
    List {
        #[arg(long)]
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a reminder
    Delete {
        /// Reminder ID
        id: String,
    },
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        ReminderAction::Add {
            title,
            due,
            owner,
            important,
            obligation_id,
        } => {
            let reminder = Reminder {
                id: Uuid::new_v4().to_string(),
                owner_id: resolve_owner(owner),
                title,
                due_at: parse_date(&due)?,
                important,
                obligation_id,
                created_at: Utc::now(),
            };
            db.insert_reminder(&reminder)?;
            println!("Reminder created: {}", reminder.id);
        }
        ReminderAction::List { owner, json } => {
            let reminders = db.list_reminders(&resolve_owner(owner))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reminders)?);
            } else {
                for r in reminders {
                    let flag = if r.important { "!" } else { " " };
                    println!("{} {} {}  due {}", flag, r.id, r.title, r.due_at.format("%Y-%m-%d %H:%M"));
                }
            }
        }
        ReminderAction::Delete { id } => {
            db.delete_reminder(&id)?;
            println!("Reminder deleted: {id}");
        }
    }
    Ok(())
}
