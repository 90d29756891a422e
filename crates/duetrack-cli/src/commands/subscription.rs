//! Premium-subscription sync commands for CLI.
//!
//! These are the account-edit entry points into the synchronizer: marking
//! an account premium upserts its subscription and derived obligation,
//! revoking premium removes both.

use chrono::Utc;
use clap::Subcommand;
use duetrack_core::{
    remove_subscription_for_account, sync_subscription_for_account, BillingPeriod, LedgerDb,
    SubscriptionDetails,
};

use super::{parse_date, resolve_owner};

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Mark an account premium and sync its derived obligation
    Set {
        /// Digital account ID
        account_id: String,
        /// Provider name (becomes the obligation name)
        #[arg(long)]
        provider: String,
        /// Billing amount (must be positive)
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Billing period: monthly, quarterly, semiannual, yearly, or lifetime
        #[arg(long)]
        period: String,
        /// First due date (YYYY-MM-DD)
        #[arg(long)]
        first_due: String,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Revoke premium: delete the subscription and its derived obligation
    Unset {
        /// Digital account ID
        account_id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show the subscription and derived obligation for an account
    Show {
        /// Digital account ID
        account_id: String,
    },
}

pub fn run(action: SubscriptionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = LedgerDb::open()?;

    match action {
        SubscriptionAction::Set {
            account_id,
            provider,
            amount,
            currency,
            period,
            first_due,
            owner,
            notes,
        } => {
            let period = BillingPeriod::parse(&period)
                .ok_or_else(|| format!("invalid period '{period}'"))?;
            let details = SubscriptionDetails {
                provider,
                amount,
                currency,
                period,
                first_due: parse_date(&first_due)?,
                notes,
            };
            let obligation = sync_subscription_for_account(
                &db,
                &account_id,
                &resolve_owner(owner),
                &details,
                Utc::now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&obligation)?);
        }
        SubscriptionAction::Unset { account_id, owner } => {
            remove_subscription_for_account(&db, &account_id, &resolve_owner(owner))?;
            println!("Subscription removed: {account_id}");
        }
        SubscriptionAction::Show { account_id } => {
            let subscription = db.subscription_for_account(&account_id)?;
            let obligations = db.obligations_for_account(&account_id)?;
            let view = serde_json::json!({
                "subscription": subscription,
                "obligations": obligations,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
