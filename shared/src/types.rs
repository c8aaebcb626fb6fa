//! Common types used across the platform

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Point in time at which a transaction happened. Always UTC.
pub type Timestamp = DateTime<Utc>;

/// Naive formats accepted in addition to RFC 3339. Naive values are read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp leniently.
///
/// Accepts RFC 3339 (`2024-10-29T19:45:21+07:00`), naive ISO-8601 date-times
/// (`2024-10-29T19:45:21`, `2024-10-29 19:45:21.123`) and bare dates (`2024-10-29`,
/// read as midnight). Returns `None` for anything else.
pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter for [`Timestamp`] fields: RFC 3339 out, [`parse_timestamp`] in.
pub mod timestamp {
    use chrono::SecondsFormat;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_timestamp, Timestamp};

    pub fn serialize<S>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw:?}")))
    }
}

/// Optional time window for queries. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    /// Window with only an upper bound.
    pub fn until(to: Timestamp) -> Self {
        Self { from: None, to: Some(to) }
    }

    pub fn contains(&self, when: &Timestamp) -> bool {
        self.from.map_or(true, |from| *when >= from) && self.to.map_or(true, |to| *when <= to)
    }
}

/// Envelope used by every API payload: `{"data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
