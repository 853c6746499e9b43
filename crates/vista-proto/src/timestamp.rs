//! Serde helpers for report timestamps.
//!
//! Reports in the wild carry start times as RFC 3339 strings, as the
//! `Date.toUTCString()` form (`Thu, 01 Jan 1970 00:00:00 GMT`) or as epoch
//! milliseconds. All three are accepted; RFC 3339 is written back.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => from_millis(ms)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::FractionalMillis(ms) => from_millis(ms as i64)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => {
            parse(&text).ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {text}")))
        }
    }
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Parses an RFC 3339 or RFC 2822 timestamp into UTC.
pub(crate) fn parse(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc_string_form() {
        let ts = parse("Thu, 01 Jan 1970 00:00:00 GMT").unwrap();
        assert_eq!(ts.timestamp_millis(), 0);
    }

    #[test]
    fn test_parse_rfc3339() {
        let ts = parse("2026-01-21T10:33:47Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-21T10:33:47+00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_none());
    }

    #[test]
    fn test_deserialize_epoch_millis() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "deserialize")]
            at: DateTime<Utc>,
        }

        let wrapper: Wrapper = serde_json::from_str(r#"{"at": 200}"#).unwrap();
        assert_eq!(wrapper.at.timestamp_millis(), 200);
    }
}
