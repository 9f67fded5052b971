//! Unified error types for the gust core.
//!
//! Decoding errors are per-payload: a failure aborts the single event being
//! decoded and never the shard stream that produced it. Intent errors are
//! configuration-time failures.

use thiserror::Error;

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors that can occur while turning a raw gateway payload into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required field is missing or has the wrong shape.
    #[error("malformed `{event}` payload: {reason}")]
    MalformedPayload {
        /// The wire event (or embedded entity) being decoded.
        event: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The lookup collaborator could not resolve an embedded fragment.
    #[error("unresolved {entity} reference: {reason}")]
    UnresolvedReference {
        /// The kind of entity that failed to resolve (`user`, `guild`, ...).
        entity: &'static str,
        /// Reason reported by the lookup.
        reason: String,
    },

    /// The event name is not one this library decodes.
    #[error("unrecognised gateway event `{0}`")]
    UnknownEvent(String),
}

impl DecodeError {
    /// Creates a malformed payload error.
    pub fn malformed(event: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            event: event.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a malformed payload error for a missing required field.
    pub fn missing_field(event: impl Into<String>, field: &str) -> Self {
        Self::malformed(event, format!("missing field `{field}`"))
    }

    /// Creates an unresolved reference error.
    pub fn unresolved(entity: &'static str, reason: impl ToString) -> Self {
        Self::UnresolvedReference {
            entity,
            reason: reason.to_string(),
        }
    }

    /// Re-attributes a malformed embedded entity to the enclosing event.
    pub fn in_event(self, event: &str) -> Self {
        match self {
            Self::MalformedPayload { event: entity, reason } if entity != event => {
                Self::MalformedPayload {
                    event: event.to_string(),
                    reason: format!("{entity}: {reason}"),
                }
            }
            other => other,
        }
    }

    /// Returns `true` for errors caused by the payload itself.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedPayload { .. })
    }
}

// =============================================================================
// Intent Errors
// =============================================================================

/// Errors raised when constructing an intent set from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// A flag name that is not part of the intent enumeration.
    #[error("unknown intent `{0}`")]
    UnknownFlag(String),

    /// Raw bits outside the defined intent enumeration.
    #[error("undefined intent bits {0:#x}")]
    UndefinedBits(u32),
}

/// A kind or family name that does not match any known event kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind `{0}`")]
pub struct UnknownEventKind(pub String);

/// An id that is not a plain decimal `u64`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid snowflake `{0}`")]
pub struct SnowflakeError(pub String);

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
