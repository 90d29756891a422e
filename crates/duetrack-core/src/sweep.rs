//! Due-date sweep: roll overdue recurring obligations forward.
//!
//! Triggered externally on a schedule (cron tick or the HTTP trigger in
//! [`crate::server`]). Each record is an independent read-modify-write; a
//! failure on one never aborts the rest of the batch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::recurrence::compute_next_due;
use crate::storage::LedgerDb;

/// Outcome of one sweep invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Overdue recurring obligations examined.
    pub scanned: usize,
    /// Due dates actually rewritten.
    pub updated: usize,
    /// Per-record write failures (logged, not fatal).
    pub failed: usize,
}

/// Scan every active recurring obligation whose due date has passed and roll
/// each forward via the recurrence engine, idempotently.
///
/// The existing `next_due` is the engine's anchor, so elapsed periods are
/// skipped in one invocation. Writes are suppressed when the engine returns
/// nothing or an unchanged date; running the sweep twice with no time
/// elapsed therefore updates zero records on the second run.
///
/// A systemic failure (the scan itself) surfaces as `Err`; the caller's
/// schedule provides the retry.
pub fn run_sweep(db: &LedgerDb, now: DateTime<Utc>) -> Result<SweepReport> {
    let overdue = db.overdue_recurring(now)?;
    let mut report = SweepReport {
        scanned: overdue.len(),
        ..Default::default()
    };

    for ob in overdue {
        let rolled = compute_next_due(ob.next_due, ob.recurrence_unit, ob.recurrence_interval, now);
        let Some(rolled) = rolled else {
            continue;
        };
        if ob.next_due == Some(rolled) {
            continue;
        }
        match db.set_next_due(&ob.id, rolled) {
            Ok(()) => report.updated += 1,
            Err(e) => {
                log::warn!("sweep: failed to roll obligation {}: {e}", ob.id);
                report.failed += 1;
            }
        }
    }

    log::info!(
        "sweep: scanned {} updated {} failed {}",
        report.scanned,
        report.updated,
        report.failed
    );
    Ok(report)
}
