//! Lenient timestamp parsing for backend payloads.
//!
//! The backend emits RFC 3339 strings for some fields and naive
//! ISO-8601 strings (no offset, implicitly UTC) for others.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::CoreError;
use crate::types::Timestamp;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    // Comma-separated millis, used by the server log listing.
    "%Y-%m-%d %H:%M:%S,%3f",
];

/// Parse a backend timestamp string into a UTC [`Timestamp`].
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, CoreError> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::Timestamp(raw.to_string()))
}

/// Serde adapter for `Option<Timestamp>` fields. `null` and `""` map to `None`.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_timestamp(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }
}
