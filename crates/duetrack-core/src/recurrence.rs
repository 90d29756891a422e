//! Recurrence engine for rolling obligation due dates forward.
//!
//! The engine is a pure function over its inputs: given an anchor date,
//! recurrence parameters, and "now", it returns the first due date at or
//! after now. All results are normalized to midnight UTC. There is no error
//! path; degenerate inputs (missing anchor, missing or non-positive
//! interval) fall back to explicit one-time semantics.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of a recurrence step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Week,
    Month,
}

impl RecurrenceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecurrenceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the next due date at or after `now`.
///
/// - `base = None` yields `None`: there is no anchor to schedule from.
/// - Missing unit/interval or `interval <= 0` yields the midnight-normalized
///   base date, treated as a fixed one-time due date.
/// - Otherwise the base is advanced in whole recurrence steps until the
///   candidate is not in the past. Week steps advance `7 * interval` days;
///   month steps advance `interval` months per step, restoring the base
///   date's day-of-month clamped to the target month's length (so
///   Jan 31 + 1 month lands on Feb 28/29, and + 2 months back on Mar 31).
///
/// A base date already at or after `now` is returned unchanged (midnight
/// normalized). The result is monotonically non-decreasing as `now` advances.
pub fn compute_next_due(
    base: Option<DateTime<Utc>>,
    unit: Option<RecurrenceUnit>,
    interval: Option<i64>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let anchor = base?.date_naive();

    let (unit, interval) = match (unit, interval) {
        (Some(u), Some(i)) if i > 0 => (u, i),
        _ => return Some(at_midnight(anchor)),
    };

    let today = now.date_naive();
    let mut candidate = anchor;
    let mut steps: i64 = 0;
    while candidate < today {
        steps += 1;
        candidate = match unit {
            RecurrenceUnit::Week => anchor + Duration::days(7 * interval * steps),
            RecurrenceUnit::Month => add_months(anchor, interval * steps, anchor.day()),
        };
    }
    Some(at_midnight(candidate))
}

/// Midnight UTC on the given calendar day.
fn at_midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Advance `date` by `months` calendar months, landing on `anchor_day`
/// clamped to the last valid day of the target month.
fn add_months(date: NaiveDate, months: i64, anchor_day: u32) -> NaiveDate {
    let zero_based = date.year() as i64 * 12 + date.month0() as i64 + months;
    let year = zero_based.div_euclid(12) as i32;
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = anchor_day.min(days_in_month(year, month));
    // Day is clamped to the month length, so the date is always valid.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// Number of days in the given month.
fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        at_midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn utc_at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn no_base_yields_none() {
        assert_eq!(
            compute_next_due(None, Some(RecurrenceUnit::Week), Some(1), Utc::now()),
            None
        );
    }

    #[test]
    fn missing_recurrence_is_one_time() {
        let base = utc_at(2024, 3, 10, 15);
        let now = utc(2024, 6, 1);
        // Time of day is stripped, date is not rolled forward.
        assert_eq!(
            compute_next_due(Some(base), None, None, now),
            Some(utc(2024, 3, 10))
        );
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), None, now),
            Some(utc(2024, 3, 10))
        );
        assert_eq!(
            compute_next_due(Some(base), None, Some(1), now),
            Some(utc(2024, 3, 10))
        );
    }

    #[test]
    fn non_positive_interval_is_one_time() {
        let base = utc(2024, 1, 1);
        let now = utc(2024, 6, 1);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Week), Some(0), now),
            Some(base)
        );
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Week), Some(-3), now),
            Some(base)
        );
    }

    #[test]
    fn future_base_returned_unchanged() {
        let base = utc_at(2024, 7, 1, 9);
        let now = utc(2024, 6, 1);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), now),
            Some(utc(2024, 7, 1))
        );
    }

    #[test]
    fn base_due_today_not_rolled() {
        let base = utc(2024, 6, 1);
        let now = utc_at(2024, 6, 1, 18);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Week), Some(1), now),
            Some(base)
        );
    }

    #[test]
    fn weekly_rollforward() {
        // Day 0, every 2 weeks, now = day 10: two steps of 14 days -> day 14.
        let base = utc(2024, 1, 1);
        let now = utc(2024, 1, 11);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Week), Some(2), now),
            Some(utc(2024, 1, 15))
        );
    }

    #[test]
    fn monthly_end_clamps() {
        // Jan 31 + 1 month with now in mid-February lands on Feb 29 (2024 is a leap year).
        let base = utc(2024, 1, 31);
        let now = utc(2024, 2, 15);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), now),
            Some(utc(2024, 2, 29))
        );
        // Non-leap year clamps to Feb 28.
        let base = utc(2023, 1, 31);
        let now = utc(2023, 2, 15);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), now),
            Some(utc(2023, 2, 28))
        );
    }

    #[test]
    fn monthly_restores_anchor_day_after_clamp() {
        // The clamp applies per step against the original anchor day, so the
        // sequence from Jan 31 is Feb 29, Mar 31, Apr 30, ...
        let base = utc(2024, 1, 31);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), utc(2024, 3, 5)),
            Some(utc(2024, 3, 31))
        );
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), utc(2024, 4, 2)),
            Some(utc(2024, 4, 30))
        );
    }

    #[test]
    fn quarterly_rollforward_across_year_boundary() {
        let base = utc(2023, 11, 15);
        let now = utc(2024, 3, 1);
        assert_eq!(
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(3), now),
            Some(utc(2024, 5, 15))
        );
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let base = utc(2023, 5, 31);
        let now = utc_at(2024, 2, 10, 13);
        let a = compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), now);
        let b = compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), now);
        assert_eq!(a, b);
    }

    #[test]
    fn refeeding_result_as_now_is_stable() {
        let base = utc(2023, 1, 31);
        let now = utc(2023, 6, 10);
        let first =
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), now).unwrap();
        let second =
            compute_next_due(Some(base), Some(RecurrenceUnit::Month), Some(1), first).unwrap();
        assert!(second >= first);
    }

    proptest! {
        /// With a positive interval the result is never in the past.
        #[test]
        fn result_at_or_after_now(
            base_offset in 0i64..3000,
            now_offset in 0i64..3000,
            interval in 1i64..30,
            weekly in proptest::bool::ANY,
        ) {
            let origin = utc(2020, 1, 1);
            let base = origin + Duration::days(base_offset);
            let now = origin + Duration::days(now_offset);
            let unit = if weekly { RecurrenceUnit::Week } else { RecurrenceUnit::Month };
            let due = compute_next_due(Some(base), Some(unit), Some(interval), now).unwrap();
            prop_assert!(due >= at_midnight(now.date_naive()) || due == at_midnight(base.date_naive()));
            prop_assert!(due >= at_midnight(base.date_naive()));
        }

        /// The due-date sequence is monotone non-decreasing as now advances.
        #[test]
        fn monotone_in_now(
            base_offset in 0i64..1000,
            now_a in 0i64..2000,
            advance in 0i64..500,
            interval in 1i64..24,
            weekly in proptest::bool::ANY,
        ) {
            let origin = utc(2020, 1, 1);
            let base = origin + Duration::days(base_offset);
            let unit = if weekly { RecurrenceUnit::Week } else { RecurrenceUnit::Month };
            let early = origin + Duration::days(now_a);
            let late = early + Duration::days(advance);
            let a = compute_next_due(Some(base), Some(unit), Some(interval), early).unwrap();
            let b = compute_next_due(Some(base), Some(unit), Some(interval), late).unwrap();
            prop_assert!(b >= a);
        }
    }
}
