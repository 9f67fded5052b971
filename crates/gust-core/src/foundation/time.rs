//! Timestamp decoding.
//!
//! Gateway timestamps are ISO-8601 strings with an explicit UTC offset.
//! A timestamp without an offset is rejected rather than interpreted in local
//! time. Use these helpers with `#[serde(with = "...")]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// The timestamp type used across the model.
pub type Timestamp = DateTime<Utc>;

/// Parses a gateway timestamp, requiring an explicit offset.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Deserializes a required timestamp.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp `{raw}`: {e}")))
}

/// Deserializes an optional timestamp; `null` and absent both become `None`.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_timestamp(&raw).map(Some).map_err(|e| {
                serde::de::Error::custom(format!("invalid timestamp `{raw}`: {e}"))
            }),
            None => Ok(None),
        }
    }
}
