//! Snowflake identifiers.
//!
//! The gateway transmits 64-bit ids as decimal strings so that JavaScript
//! clients do not lose precision. [`Snowflake`] decodes from either a numeric
//! string or a JSON integer and always encodes back to a string.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SnowflakeError;

/// Milliseconds between the Unix epoch and the platform epoch (2015-01-01).
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

/// A 64-bit unsigned platform identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Wraps a raw id.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the instant this id was generated.
    pub fn created_at(self) -> DateTime<Utc> {
        let millis = (self.0 >> 22) + PLATFORM_EPOCH_MS;
        Utc.timestamp_millis_opt(millis as i64)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(value: Snowflake) -> Self {
        value.0
    }
}

impl FromStr for Snowflake {
    type Err = SnowflakeError;

    /// Accepts ASCII digits only; signs and whitespace are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SnowflakeError(s.to_string()));
        }
        s.parse().map(Self).map_err(|_| SnowflakeError(s.to_string()))
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake as a numeric string or unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Snowflake(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(Snowflake)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_from_string() {
        let id: Snowflake = serde_json::from_value(json!("165176875973476352")).unwrap();
        assert_eq!(id.get(), 165_176_875_973_476_352);
    }

    #[test]
    fn test_decode_from_integer() {
        let id: Snowflake = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(id, Snowflake::new(42));
    }

    #[test]
    fn test_reject_non_numeric() {
        assert!(serde_json::from_value::<Snowflake>(json!("not-a-number")).is_err());
        assert!(serde_json::from_value::<Snowflake>(json!(-1)).is_err());
        assert!(serde_json::from_value::<Snowflake>(json!(1.5)).is_err());
    }

    #[test]
    fn test_reject_signs_and_padding() {
        for raw in ["+5", "-5", " 5", "5 ", "", "18446744073709551616"] {
            assert_eq!(raw.parse::<Snowflake>(), Err(SnowflakeError(raw.to_string())));
            assert!(serde_json::from_value::<Snowflake>(json!(raw)).is_err(), "{raw:?}");
        }
        assert_eq!("0042".parse::<Snowflake>(), Ok(Snowflake::new(42)));
    }

    #[test]
    fn test_encodes_as_string() {
        let value = serde_json::to_value(Snowflake::new(80351110224678912)).unwrap();
        assert_eq!(value, json!("80351110224678912"));
    }

    #[test]
    fn test_created_at() {
        // 175928847299117063 was generated at 2016-04-30T11:18:25.796Z.
        let id = Snowflake::new(175_928_847_299_117_063);
        assert_eq!(id.created_at().timestamp_millis(), 1_462_015_105_796);
    }
}
