//! Entity lookup collaborator.
//!
//! Payloads embed users, guilds and channels. The decoder hands every such
//! fragment to an [`EntityLookup`], which may return a cached instance or
//! record the fragment in a cache as a side effect. The cache itself lives
//! outside this crate.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::model::{Channel, Guild, User};

/// Resolves embedded fragments into domain objects.
///
/// Implementations should return [`DecodeError::UnresolvedReference`] when a
/// fragment is well-formed but cannot be resolved, and
/// [`DecodeError::MalformedPayload`] when the fragment itself is broken.
pub trait EntityLookup: Send + Sync {
    fn resolve_user(&self, payload: &Value) -> DecodeResult<User>;

    fn resolve_guild(&self, payload: &Value) -> DecodeResult<Guild>;

    fn resolve_channel(&self, payload: &Value) -> DecodeResult<Channel>;
}

/// Stateless lookup that decodes each fragment directly.
///
/// Used by clients that run without an entity cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughLookup;

impl PassthroughLookup {
    fn decode<T: DeserializeOwned>(entity: &str, payload: &Value) -> DecodeResult<T> {
        T::deserialize(payload).map_err(|e| DecodeError::malformed(entity, e))
    }
}

impl EntityLookup for PassthroughLookup {
    fn resolve_user(&self, payload: &Value) -> DecodeResult<User> {
        Self::decode("user", payload)
    }

    fn resolve_guild(&self, payload: &Value) -> DecodeResult<Guild> {
        Self::decode("guild", payload)
    }

    fn resolve_channel(&self, payload: &Value) -> DecodeResult<Channel> {
        Self::decode("channel", payload)
    }
}
