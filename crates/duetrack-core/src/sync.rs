//! Subscription-to-obligation synchronizer.
//!
//! Keeps exactly one derived [`Obligation`] in step with each premium
//! digital subscription. The derived obligation is a projection of current
//! subscription state: every sync overwrites it in full, so user edits to a
//! derived record do not survive the next sync.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DatabaseError, Result, ValidationError};
use crate::model::{BillingPeriod, DigitalSubscription, Obligation, ObligationCategory};
use crate::recurrence::compute_next_due;
use crate::storage::LedgerDb;

/// Validated input for marking an account premium.
#[derive(Debug, Clone)]
pub struct SubscriptionDetails {
    pub provider: String,
    pub amount: f64,
    pub currency: String,
    pub period: BillingPeriod,
    pub first_due: DateTime<Utc>,
    pub notes: Option<String>,
}

impl SubscriptionDetails {
    /// Fail-fast validation, run before anything is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider.trim().is_empty() {
            return Err(ValidationError::MissingField("provider"));
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingField("currency"));
        }
        if !(self.amount > 0.0) {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

/// Upsert the subscription record for an account and (re)derive its obligation.
///
/// Runs as one transaction: subscription upsert, obligation overwrite, and
/// duplicate cleanup either all land or none do. The duplicate cleanup is
/// permanent self-healing: all obligations linked to the account are loaded
/// in due-date order, the earliest is overwritten in place as the primary,
/// and any extras left behind by historical races are deleted.
///
/// Returns the derived obligation.
pub fn sync_subscription_for_account(
    db: &LedgerDb,
    account_id: &str,
    owner_id: &str,
    details: &SubscriptionDetails,
    now: DateTime<Utc>,
) -> Result<Obligation> {
    details.validate()?;

    let (unit, interval) = match details.period.recurrence() {
        Some((u, i)) => (Some(u), Some(i)),
        None => (None, None),
    };
    let next_due = compute_next_due(Some(details.first_due), unit, interval, now);

    let tx = db
        .conn()
        .unchecked_transaction()
        .map_err(DatabaseError::from)?;

    // Subscription is the source of truth; write it first.
    let existing = db.subscription_for_account(account_id)?;
    let sub = DigitalSubscription {
        id: existing
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        account_id: account_id.to_string(),
        owner_id: owner_id.to_string(),
        provider: details.provider.clone(),
        amount: details.amount,
        currency: details.currency.clone(),
        period: details.period,
        first_due: details.first_due,
        created_at: existing.as_ref().map(|s| s.created_at).unwrap_or(now),
        updated_at: now,
    };
    db.upsert_subscription(&sub)?;

    let mut linked = db.obligations_for_account(account_id)?;
    let obligation = if linked.is_empty() {
        let ob = derived_obligation(
            Uuid::new_v4().to_string(),
            account_id,
            owner_id,
            details,
            next_due,
            now,
            now,
        );
        db.insert_obligation(&ob)?;
        ob
    } else {
        let primary = linked.remove(0);
        for duplicate in linked {
            db.delete_obligation(&duplicate.id)?;
        }
        let ob = derived_obligation(
            primary.id,
            account_id,
            owner_id,
            details,
            next_due,
            primary.created_at,
            now,
        );
        db.update_obligation(&ob)?;
        ob
    };

    tx.commit().map_err(DatabaseError::from)?;
    Ok(obligation)
}

/// Delete the subscription for an account along with its derived
/// obligation(s), atomically. Invoked when premium status is turned off.
pub fn remove_subscription_for_account(
    db: &LedgerDb,
    account_id: &str,
    owner_id: &str,
) -> Result<()> {
    let tx = db
        .conn()
        .unchecked_transaction()
        .map_err(DatabaseError::from)?;

    db.delete_obligations_for_account(account_id, owner_id)?;
    db.delete_subscription_for_account(account_id, owner_id)?;

    tx.commit().map_err(DatabaseError::from)?;
    Ok(())
}

/// The full projection of subscription state onto the derived obligation.
fn derived_obligation(
    id: String,
    account_id: &str,
    owner_id: &str,
    details: &SubscriptionDetails,
    next_due: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Obligation {
    let (unit, interval) = match details.period.recurrence() {
        Some((u, i)) => (Some(u), Some(i)),
        None => (None, None),
    };
    Obligation {
        id,
        owner_id: owner_id.to_string(),
        name: details.provider.clone(),
        category: ObligationCategory::Payment,
        amount: Some(details.amount),
        currency: details.currency.clone(),
        next_due,
        is_recurring: details.period.recurrence().is_some(),
        recurrence_unit: unit,
        recurrence_interval: interval,
        is_active: true,
        is_done: false,
        account_id: Some(account_id.to_string()),
        notes: details.notes.clone(),
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecurrenceUnit;
    use chrono::TimeZone;

    fn details(period: BillingPeriod) -> SubscriptionDetails {
        SubscriptionDetails {
            provider: "StreamCo".into(),
            amount: 100.0,
            currency: "USD".into(),
            period,
            first_due: Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
            notes: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn sync_creates_one_subscription_and_one_obligation() {
        let db = LedgerDb::open_memory().unwrap();
        let ob =
            sync_subscription_for_account(&db, "acc", "owner", &details(BillingPeriod::Monthly), now())
                .unwrap();

        assert!(ob.is_recurring);
        assert_eq!(ob.recurrence_unit, Some(RecurrenceUnit::Month));
        assert_eq!(ob.recurrence_interval, Some(1));
        assert_eq!(ob.category, ObligationCategory::Payment);
        assert_eq!(ob.amount, Some(100.0));
        assert_eq!(
            ob.next_due,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
        );

        assert_eq!(db.obligations_for_account("acc").unwrap().len(), 1);
        assert!(db.subscription_for_account("acc").unwrap().is_some());
    }

    #[test]
    fn sync_is_idempotent() {
        let db = LedgerDb::open_memory().unwrap();
        let d = details(BillingPeriod::Monthly);
        let first = sync_subscription_for_account(&db, "acc", "owner", &d, now()).unwrap();
        let second = sync_subscription_for_account(&db, "acc", "owner", &d, now()).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.next_due, second.next_due);
        assert_eq!(db.obligations_for_account("acc").unwrap().len(), 1);
        assert_eq!(db.list_subscriptions("owner").unwrap().len(), 1);
    }

    #[test]
    fn sync_clobbers_user_edits_on_derived_record() {
        let db = LedgerDb::open_memory().unwrap();
        let d = details(BillingPeriod::Monthly);
        let ob = sync_subscription_for_account(&db, "acc", "owner", &d, now()).unwrap();

        let mut edited = db.get_obligation(&ob.id).unwrap().unwrap();
        edited.name = "my renamed bill".into();
        edited.amount = Some(1.0);
        db.update_obligation(&edited).unwrap();

        let resynced = sync_subscription_for_account(&db, "acc", "owner", &d, now()).unwrap();
        assert_eq!(resynced.name, "StreamCo");
        assert_eq!(resynced.amount, Some(100.0));
    }

    #[test]
    fn sync_heals_duplicate_obligations() {
        let db = LedgerDb::open_memory().unwrap();
        let d = details(BillingPeriod::Monthly);
        let ob = sync_subscription_for_account(&db, "acc", "owner", &d, now()).unwrap();

        // Simulate a historical race that produced a second linked record.
        let mut dup = ob.clone();
        dup.id = "dup".into();
        dup.next_due = Some(Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap());
        db.insert_obligation(&dup).unwrap();
        assert_eq!(db.obligations_for_account("acc").unwrap().len(), 2);

        let healed = sync_subscription_for_account(&db, "acc", "owner", &d, now()).unwrap();
        let remaining = db.obligations_for_account("acc").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, healed.id);
        assert_eq!(healed.id, ob.id);
    }

    #[test]
    fn lifetime_period_derives_one_time_obligation() {
        let db = LedgerDb::open_memory().unwrap();
        let ob = sync_subscription_for_account(
            &db,
            "acc",
            "owner",
            &details(BillingPeriod::Lifetime),
            now(),
        )
        .unwrap();

        assert!(!ob.is_recurring);
        assert_eq!(ob.recurrence_unit, None);
        assert_eq!(ob.recurrence_interval, None);
        // One-time due date: the first-due anchor, midnight normalized.
        assert_eq!(
            ob.next_due,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
        );
        assert!(ob.validate().is_ok());
    }

    #[test]
    fn yearly_first_due_in_past_rolls_forward() {
        let db = LedgerDb::open_memory().unwrap();
        let mut d = details(BillingPeriod::Yearly);
        d.first_due = Utc.with_ymd_and_hms(2022, 5, 20, 0, 0, 0).unwrap();
        let ob = sync_subscription_for_account(
            &db,
            "acc",
            "owner",
            &d,
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(
            ob.next_due,
            Some(Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap())
        );
        assert_eq!(ob.recurrence_interval, Some(12));
    }

    #[test]
    fn validation_failure_leaves_store_untouched() {
        let db = LedgerDb::open_memory().unwrap();
        let mut d = details(BillingPeriod::Monthly);
        d.amount = 0.0;

        let err = sync_subscription_for_account(&db, "acc", "owner", &d, now());
        assert!(err.is_err());
        assert!(db.subscription_for_account("acc").unwrap().is_none());
        assert!(db.obligations_for_account("acc").unwrap().is_empty());
    }

    #[test]
    fn remove_deletes_obligation_and_subscription() {
        let db = LedgerDb::open_memory().unwrap();
        sync_subscription_for_account(&db, "acc", "owner", &details(BillingPeriod::Monthly), now())
            .unwrap();

        remove_subscription_for_account(&db, "acc", "owner").unwrap();

        assert!(db.subscription_for_account("acc").unwrap().is_none());
        assert!(db.obligations_for_account("acc").unwrap().is_empty());
    }
}
