//! Non-fatal failures reported on the dispatcher's diagnostics channel.
//!
//! Nothing that goes wrong while handling a single event stops the client:
//! failing listeners, broken payloads and events outside the declared intents
//! are all reported here and logged, then processing continues.

use std::fmt;
use std::sync::Arc;

use gust_core::{DecodeError, EventKind, Requirement, ShardId};

use crate::subscription::SubscriptionId;

/// A listener returned an error or panicked.
#[derive(Debug, Clone)]
pub struct ListenerFailure {
    pub subscription: SubscriptionId,
    pub kind: EventKind,
    pub shard: ShardId,
    pub cause: FailureCause,
}

/// Why a listener failed.
#[derive(Debug, Clone)]
pub enum FailureCause {
    Error(Arc<anyhow::Error>),
    Panic(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(error) => write!(f, "{error:#}"),
            Self::Panic(message) => write!(f, "panicked: {message}"),
        }
    }
}

/// A diagnostic published by the dispatcher or a shard pump.
#[derive(Debug, Clone)]
pub enum Diagnostic {
    /// A listener failed. Other listeners still ran.
    ListenerFailure(ListenerFailure),

    /// A payload could not be decoded and was skipped.
    DecodeFailure {
        shard: ShardId,
        event_name: String,
        error: DecodeError,
    },

    /// An event arrived whose requirement the declared intents do not meet.
    CapabilityViolation {
        kind: EventKind,
        shard: ShardId,
        requirement: Requirement,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListenerFailure(failure) => write!(
                f,
                "listener {} for {} on {} failed: {}",
                failure.subscription, failure.kind, failure.shard, failure.cause
            ),
            Self::DecodeFailure {
                shard,
                event_name,
                error,
            } => write!(f, "failed to decode {event_name} on {shard}: {error}"),
            Self::CapabilityViolation {
                kind,
                shard,
                requirement,
            } => write!(f, "{kind} on {shard} requires {requirement}; not delivered"),
        }
    }
}
