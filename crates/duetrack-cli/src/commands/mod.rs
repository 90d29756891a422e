pub mod config;
pub mod horizon;
pub mod income;
pub mod obligation;
pub mod rates;
pub mod reminder;
pub mod subscription;
pub mod sweep;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use duetrack_core::Config;

/// Parse a date argument: `YYYY-MM-DD` (midnight UTC) or full RFC3339.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN).and_utc());
    }
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|_| format!("invalid date '{s}': expected YYYY-MM-DD or RFC3339"))?
        .with_timezone(&Utc))
}

/// Owner from `--owner` or the configured default.
pub fn resolve_owner(owner: Option<String>) -> String {
    owner.unwrap_or_else(|| Config::load_or_default().default_owner)
}
