use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RandimgError, Result};

/// ISO-8601, seconds precision, no offset (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One accepted request, as stored in the tracker and archive files.
///
/// On disk this is a flat JSON object: `timestamp` first, followed by the
/// metadata keys in the order they were inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub timestamp: String,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl RequestRecord {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            metadata: Map::new(),
        }
    }

    /// Builder-style metadata insertion
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn parsed_timestamp(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp, dropping any sub-second part.
///
/// Accepts naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as local time) and
/// RFC 3339 strings with an offset, which are converted to local time.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| {
            DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Local).naive_local())
        })
        .map_err(|_| RandimgError::InvalidTimestamp(value.to_string()))?;

    Ok(parsed.with_nanosecond(0).unwrap_or(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_format_timestamp_seconds_precision() {
        assert_eq!(format_timestamp(at(7, 5, 3)), "2024-03-09T07:05:03");
    }

    #[test]
    fn test_parse_timestamp_plain() {
        assert_eq!(parse_timestamp("2024-03-09T07:05:03").unwrap(), at(7, 5, 3));
    }

    #[test]
    fn test_parse_timestamp_drops_microseconds() {
        assert_eq!(
            parse_timestamp("2024-03-09T07:05:03.918273").unwrap(),
            at(7, 5, 3)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, RandimgError::InvalidTimestamp(ref v) if v == "yesterday"));
    }

    #[test]
    fn test_record_serializes_flat_with_timestamp_first() {
        let record = RequestRecord::new("2024-03-09T07:05:03")
            .with("username", "jdoe")
            .with("image_id", "abc123")
            .with("format", "jpg");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2024-03-09T07:05:03","username":"jdoe","image_id":"abc123","format":"jpg"}"#
        );
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let json = r#"{"timestamp":"2024-03-09T07:05:03","width":"3840","extra":{"nested":true}}"#;
        let record: RequestRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.timestamp, "2024-03-09T07:05:03");
        assert_eq!(record.get("width"), Some(&Value::from("3840")));
        assert!(record.get("extra").is_some());
        assert_eq!(record.metadata.len(), 2);
    }

    #[test]
    fn test_record_without_timestamp_is_rejected() {
        let json = r#"{"username":"jdoe"}"#;
        assert!(serde_json::from_str::<RequestRecord>(json).is_err());
    }
}
