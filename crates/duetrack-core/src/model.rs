//! Data model: obligations, digital subscriptions, reminders, and incomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::recurrence::RecurrenceUnit;

/// Category of an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationCategory {
    Payment,
    Legal,
    Other,
}

impl ObligationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Legal => "legal",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payment" => Some(Self::Payment),
            "legal" => Some(Self::Legal),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A recurring or one-time financial/legal commitment tracked with a due date.
///
/// `next_due` is a derived field owned by the recurrence engine, the sweep,
/// and the subscription synchronizer; callers must not write it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category: ObligationCategory,
    /// None means "amount unknown", which is a valid state.
    pub amount: Option<f64>,
    pub currency: String,
    pub next_due: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_unit: Option<RecurrenceUnit>,
    pub recurrence_interval: Option<i64>,
    pub is_active: bool,
    pub is_done: bool,
    /// Originating digital account, set only on synchronizer-derived records.
    pub account_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Obligation {
    /// Check the recurrence invariant.
    ///
    /// Recurring obligations must carry both a unit and a positive interval;
    /// one-time obligations must carry neither.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_recurring {
            match self.recurrence_interval {
                Some(i) if i > 0 => {}
                Some(i) => {
                    return Err(ValidationError::InvalidValue {
                        field: "recurrence_interval",
                        message: format!("must be positive, got {i}"),
                    })
                }
                None => return Err(ValidationError::MissingField("recurrence_interval")),
            }
            if self.recurrence_unit.is_none() {
                return Err(ValidationError::MissingField("recurrence_unit"));
            }
        } else if self.recurrence_unit.is_some() || self.recurrence_interval.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "is_recurring",
                message: "recurrence fields set on a non-recurring obligation".into(),
            });
        }
        Ok(())
    }
}

/// Billing period of a premium digital subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Quarterly,
    Semiannual,
    Yearly,
    Lifetime,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Yearly => "yearly",
            Self::Lifetime => "lifetime",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "semiannual" => Some(Self::Semiannual),
            "yearly" => Some(Self::Yearly),
            "lifetime" => Some(Self::Lifetime),
            _ => None,
        }
    }

    /// Recurrence parameters for the derived obligation.
    ///
    /// Lifetime subscriptions are non-recurring and yield `None`.
    pub fn recurrence(&self) -> Option<(RecurrenceUnit, i64)> {
        match self {
            Self::Monthly => Some((RecurrenceUnit::Month, 1)),
            Self::Quarterly => Some((RecurrenceUnit::Month, 3)),
            Self::Semiannual => Some((RecurrenceUnit::Month, 6)),
            Self::Yearly => Some((RecurrenceUnit::Month, 12)),
            Self::Lifetime => None,
        }
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Premium subscription record backing a digital account.
///
/// At most one per account; drives exactly one derived [`Obligation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalSubscription {
    pub id: String,
    pub account_id: String,
    pub owner_id: String,
    pub provider: String,
    pub amount: f64,
    pub currency: String,
    pub period: BillingPeriod,
    pub first_due: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fixed-date reminder, independent of recurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub due_at: DateTime<Utc>,
    pub important: bool,
    /// Optional cross-reference for horizon views.
    pub obligation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A dated income record, consumed by the horizon aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    pub owner_id: String,
    pub source: String,
    pub amount: f64,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn obligation() -> Obligation {
        Obligation {
            id: "ob-1".into(),
            owner_id: "owner".into(),
            name: "Rent".into(),
            category: ObligationCategory::Payment,
            amount: Some(1200.0),
            currency: "EUR".into(),
            next_due: None,
            is_recurring: false,
            recurrence_unit: None,
            recurrence_interval: None,
            is_active: true,
            is_done: false,
            account_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn one_time_obligation_is_valid() {
        assert!(obligation().validate().is_ok());
    }

    #[test]
    fn recurring_requires_unit_and_positive_interval() {
        let mut ob = obligation();
        ob.is_recurring = true;
        assert!(ob.validate().is_err());

        ob.recurrence_unit = Some(RecurrenceUnit::Month);
        ob.recurrence_interval = Some(0);
        assert!(ob.validate().is_err());

        ob.recurrence_interval = Some(1);
        assert!(ob.validate().is_ok());
    }

    #[test]
    fn non_recurring_rejects_stray_recurrence_fields() {
        let mut ob = obligation();
        ob.recurrence_unit = Some(RecurrenceUnit::Week);
        assert!(ob.validate().is_err());
    }

    #[test]
    fn billing_period_mapping() {
        assert_eq!(
            BillingPeriod::Monthly.recurrence(),
            Some((RecurrenceUnit::Month, 1))
        );
        assert_eq!(
            BillingPeriod::Quarterly.recurrence(),
            Some((RecurrenceUnit::Month, 3))
        );
        assert_eq!(
            BillingPeriod::Semiannual.recurrence(),
            Some((RecurrenceUnit::Month, 6))
        );
        assert_eq!(
            BillingPeriod::Yearly.recurrence(),
            Some((RecurrenceUnit::Month, 12))
        );
        assert_eq!(BillingPeriod::Lifetime.recurrence(), None);
    }

    #[test]
    fn obligation_serialization_round_trip() {
        let ob = obligation();
        let json = serde_json::to_string(&ob).unwrap();
        let decoded: Obligation = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.name, "Rent");
        assert_eq!(decoded.category, ObligationCategory::Payment);
    }
}
