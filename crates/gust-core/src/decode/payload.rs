//! Field access over an untyped payload object.
//!
//! Every accessor reports failures as [`DecodeError::MalformedPayload`]
//! tagged with the wire event name, so a log line always says which event and
//! which field broke.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::foundation::{Timestamp, time};

/// A payload object being decoded for one wire event.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    event: &'a str,
    value: &'a Value,
}

impl<'a> Payload<'a> {
    /// Wraps `value`, which must be a JSON object.
    pub fn new(event: &'a str, value: &'a Value) -> DecodeResult<Self> {
        if value.is_object() {
            Ok(Self { event, value })
        } else {
            Err(DecodeError::malformed(
                event,
                format!("expected an object, found {}", type_name(value)),
            ))
        }
    }

    /// The wire event name.
    pub fn event(&self) -> &'a str {
        self.event
    }

    /// The whole payload.
    pub fn raw(&self) -> &'a Value {
        self.value
    }

    /// Returns the field if it is present and not `null`.
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.value.get(field).filter(|v| !v.is_null())
    }

    /// Returns `true` if the field is present and not `null`.
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Decodes a required field.
    pub fn required<T: DeserializeOwned>(&self, field: &str) -> DecodeResult<T> {
        let raw = self
            .get(field)
            .ok_or_else(|| DecodeError::missing_field(self.event, field))?;
        self.convert(field, raw)
    }

    /// Decodes an optional field; absent and `null` both yield `None`.
    pub fn optional<T: DeserializeOwned>(&self, field: &str) -> DecodeResult<Option<T>> {
        self.get(field).map(|raw| self.convert(field, raw)).transpose()
    }

    /// Decodes a boolean that defaults to `false`.
    pub fn flag(&self, field: &str) -> DecodeResult<bool> {
        Ok(self.optional(field)?.unwrap_or(false))
    }

    /// Decodes an optional timestamp. A timestamp without offset is malformed.
    pub fn optional_timestamp(&self, field: &str) -> DecodeResult<Option<Timestamp>> {
        self.optional::<String>(field)?
            .map(|raw| {
                time::parse_timestamp(&raw).map_err(|e| {
                    DecodeError::malformed(self.event, format!("field `{field}`: {e}"))
                })
            })
            .transpose()
    }

    /// Decodes a required timestamp.
    pub fn timestamp(&self, field: &str) -> DecodeResult<Timestamp> {
        self.optional_timestamp(field)?
            .ok_or_else(|| DecodeError::missing_field(self.event, field))
    }

    /// Returns a required embedded object.
    pub fn object(&self, field: &str) -> DecodeResult<&'a Value> {
        match self.get(field) {
            Some(raw) if raw.is_object() => Ok(raw),
            Some(raw) => Err(DecodeError::malformed(
                self.event,
                format!("field `{field}`: expected an object, found {}", type_name(raw)),
            )),
            None => Err(DecodeError::missing_field(self.event, field)),
        }
    }

    /// Returns an optional embedded object.
    pub fn optional_object(&self, field: &str) -> DecodeResult<Option<&'a Value>> {
        if self.has(field) {
            self.object(field).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Decodes the whole payload as a model.
    pub fn model<T: DeserializeOwned>(&self) -> DecodeResult<T> {
        T::deserialize(self.value).map_err(|e| DecodeError::malformed(self.event, e))
    }

    fn convert<T: DeserializeOwned>(&self, field: &str, raw: &Value) -> DecodeResult<T> {
        T::deserialize(raw)
            .map_err(|e| DecodeError::malformed(self.event, format!("field `{field}`: {e}")))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
