//! # Duetrack Core Library
//!
//! Scheduling core of the Duetrack personal finance tracker. All operations
//! are available through this library and the standalone CLI binary; any
//! GUI is a thin layer over the same calls.
//!
//! ## Architecture
//!
//! - **Recurrence Engine**: a pure function that rolls a due date forward
//!   across elapsed weekly/monthly periods
//! - **Storage**: SQLite-backed ledger for obligations, subscriptions,
//!   reminders, and incomes, plus TOML-based configuration
//! - **Synchronizer**: keeps one derived obligation in step with each
//!   premium digital subscription
//! - **Sweep**: scheduled batch job advancing overdue recurring obligations
//! - **Horizon**: week/month/year bucketing of upcoming dated items
//!
//! ## Key Components
//!
//! - [`compute_next_due`]: the recurrence engine entry point
//! - [`LedgerDb`]: obligation and subscription persistence
//! - [`sync_subscription_for_account`]: subscription-to-obligation sync
//! - [`run_sweep`]: the due-date sweep
//! - [`build_horizon`]: the horizon aggregator

pub mod error;
pub mod horizon;
pub mod model;
pub mod rates;
pub mod recurrence;
pub mod server;
pub mod storage;
pub mod sweep;
pub mod sync;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use horizon::{build_horizon, days_left, Horizon, HorizonItem, HorizonKind};
pub use model::{
    BillingPeriod, DigitalSubscription, Income, Obligation, ObligationCategory, Reminder,
};
pub use rates::{RateClient, RateTable};
pub use recurrence::{compute_next_due, RecurrenceUnit};
pub use storage::{Config, LedgerDb};
pub use sweep::{run_sweep, SweepReport};
pub use sync::{
    remove_subscription_for_account, sync_subscription_for_account, SubscriptionDetails,
};
