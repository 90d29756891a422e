//! Horizon aggregator: bucket upcoming dated items into week/month/year views.
//!
//! A read-only consumer of obligations, reminders, and incomes. Overdue
//! items are excluded here (they are surfaced elsewhere), as is anything
//! more than a year out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Income, Obligation, Reminder};

/// What kind of record a horizon item was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonKind {
    Obligation,
    Reminder,
    Income,
}

impl HorizonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Obligation => "obligation",
            Self::Reminder => "reminder",
            Self::Income => "income",
        }
    }
}

/// Uniform shape for a dated item on the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonItem {
    pub id: String,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub days_left: i64,
    pub kind: HorizonKind,
}

/// Week/month/year buckets, each sorted by urgency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Horizon {
    pub week: Vec<HorizonItem>,
    pub month: Vec<HorizonItem>,
    pub year: Vec<HorizonItem>,
}

/// Whole calendar days between now and the due date.
///
/// Calendar-day granularity, not elapsed-hours truncation: something due
/// later today is 0 days away regardless of the time of day.
pub fn days_left(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due.date_naive() - now.date_naive()).num_days()
}

enum Bucket {
    Week,
    Month,
    Year,
}

fn bucket_for(days: i64) -> Option<Bucket> {
    match days {
        d if d < 0 => None,
        0..=7 => Some(Bucket::Week),
        8..=30 => Some(Bucket::Month),
        31..=365 => Some(Bucket::Year),
        _ => None,
    }
}

/// Assemble the horizon from the three record collections.
///
/// Obligations without a due date, done, or inactive ones are skipped.
/// Within each bucket items are sorted by `days_left` ascending, ties broken
/// by the raw due datetime.
pub fn build_horizon(
    obligations: &[Obligation],
    reminders: &[Reminder],
    incomes: &[Income],
    now: DateTime<Utc>,
) -> Horizon {
    let mut horizon = Horizon::default();

    let items = obligations
        .iter()
        .filter(|ob| ob.is_active && !ob.is_done)
        .filter_map(|ob| {
            ob.next_due.map(|due| HorizonItem {
                id: ob.id.clone(),
                title: ob.name.clone(),
                due_date: due,
                days_left: days_left(due, now),
                kind: HorizonKind::Obligation,
            })
        })
        .chain(reminders.iter().map(|r| HorizonItem {
            id: r.id.clone(),
            title: r.title.clone(),
            due_date: r.due_at,
            days_left: days_left(r.due_at, now),
            kind: HorizonKind::Reminder,
        }))
        .chain(incomes.iter().map(|i| HorizonItem {
            id: i.id.clone(),
            title: i.source.clone(),
            due_date: i.occurred_at,
            days_left: days_left(i.occurred_at, now),
            kind: HorizonKind::Income,
        }));

    for item in items {
        match bucket_for(item.days_left) {
            Some(Bucket::Week) => horizon.week.push(item),
            Some(Bucket::Month) => horizon.month.push(item),
            Some(Bucket::Year) => horizon.year.push(item),
            None => {}
        }
    }

    for bucket in [
        &mut horizon.week,
        &mut horizon.month,
        &mut horizon.year,
    ] {
        bucket.sort_by(|a, b| {
            a.days_left
                .cmp(&b.days_left)
                .then(a.due_date.cmp(&b.due_date))
        });
    }

    horizon
}
