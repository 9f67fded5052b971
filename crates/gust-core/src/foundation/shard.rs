//! Shard identity and the transport-facing feed types.
//!
//! The gateway transport is an external collaborator. The event core only
//! needs two things from it: the identity of the shard a payload arrived on,
//! and an ordered feed of `(event name, payload)` pairs.

use std::fmt;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identity of the gateway connection that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(u32);

impl ShardId {
    /// Creates a shard identity.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw shard index.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard-{}", self.0)
    }
}

/// A gateway connection as seen by the event core.
pub trait GatewayShard: Send + Sync {
    /// Returns the identity of this shard.
    fn shard_id(&self) -> ShardId;
}

impl GatewayShard for ShardId {
    fn shard_id(&self) -> ShardId {
        *self
    }
}

/// One dispatch payload as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDispatch {
    /// The wire event name (the `t` field of a dispatch frame).
    pub event_name: String,
    /// The decoded but untyped payload (the `d` field).
    pub payload: Value,
}

impl RawDispatch {
    /// Creates a raw dispatch.
    pub fn new(event_name: impl Into<String>, payload: Value) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
        }
    }
}

/// Ordered stream of raw payloads for a single shard.
pub type ShardFeed = BoxStream<'static, RawDispatch>;
