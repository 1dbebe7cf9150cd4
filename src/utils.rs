// Utility functions
use chrono::{DateTime, NaiveDate, Utc};

/// Parses a sensing date from either `YYYY-MM-DD` or an RFC 3339 timestamp.
/// Timestamps are converted to UTC before the date is taken.
pub fn parse_sensing_date(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Serde adapter accepting the same formats as [`parse_sensing_date`].
pub mod sensing_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_sensing_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid sensing date: {raw:?}")))
    }
}
