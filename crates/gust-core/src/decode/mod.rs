//! Payload decoding.
//!
//! [`decode`] turns a wire event name and its untyped payload into a
//! [`GatewayEvent`]. Decoding is pure and synchronous; the only collaborator
//! is the [`EntityLookup`] carried by the [`DecodeContext`], which resolves
//! embedded users, guilds and channels.
//!
//! ```rust,ignore
//! use gust_core::decode::{decode, DecodeContext};
//!
//! let ctx = DecodeContext::new(ShardId::new(0));
//! let event = decode("GUILD_BAN_ADD", &payload, &ctx)?;
//! assert_eq!(event.kind(), EventKind::BanCreate);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{DecodeError, DecodeResult};
use crate::event::*;
use crate::foundation::{GatewayShard, ShardId, Snowflake};
use crate::model::{
    Channel, ChannelRef, GuildRef, Invite, InviteMetadata, KnownCustomEmoji, Member,
    MemberPresence, PartialUser, UnavailableGuild, User,
};

pub mod lookup;
pub mod payload;

pub use lookup::{EntityLookup, PassthroughLookup};
pub use payload::Payload;

// ============================================================================
// Decode Context
// ============================================================================

/// Per-shard state needed to decode payloads.
#[derive(Clone)]
pub struct DecodeContext {
    shard: ShardId,
    lookup: Arc<dyn EntityLookup>,
}

impl DecodeContext {
    /// A context for `shard` that decodes fragments without a cache.
    pub fn new(shard: impl GatewayShard) -> Self {
        Self::with_lookup(shard, Arc::new(PassthroughLookup))
    }

    /// A context for `shard` that resolves fragments through `lookup`.
    pub fn with_lookup(shard: impl GatewayShard, lookup: Arc<dyn EntityLookup>) -> Self {
        Self {
            shard: shard.shard_id(),
            lookup,
        }
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn lookup(&self) -> &dyn EntityLookup {
        self.lookup.as_ref()
    }
}

impl fmt::Debug for DecodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeContext")
            .field("shard", &self.shard)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Event Names
// ============================================================================

/// Every wire event name this decoder understands.
pub const EVENT_NAMES: &[&str] = &[
    "CHANNEL_CREATE",
    "CHANNEL_UPDATE",
    "CHANNEL_DELETE",
    "CHANNEL_PINS_UPDATE",
    "INVITE_CREATE",
    "INVITE_DELETE",
    "WEBHOOKS_UPDATE",
    "GUILD_CREATE",
    "GUILD_DELETE",
    "GUILD_UPDATE",
    "GUILD_BAN_ADD",
    "GUILD_BAN_REMOVE",
    "GUILD_EMOJIS_UPDATE",
    "GUILD_INTEGRATIONS_UPDATE",
    "PRESENCE_UPDATE",
    "GUILD_MEMBER_ADD",
    "GUILD_MEMBER_UPDATE",
    "GUILD_MEMBER_REMOVE",
    "READY",
    "RESUMED",
];

/// Returns `true` if `event_name` is decoded by [`decode`].
pub fn is_known(event_name: &str) -> bool {
    EVENT_NAMES.contains(&event_name)
}

// ============================================================================
// Decode
// ============================================================================

/// Decodes one raw dispatch into a typed event.
///
/// # Errors
///
/// - [`DecodeError::UnknownEvent`] if `event_name` is not recognised
/// - [`DecodeError::MalformedPayload`] if a required field is missing or mistyped
/// - [`DecodeError::UnresolvedReference`] if the lookup rejects a fragment
pub fn decode(event_name: &str, raw: &Value, ctx: &DecodeContext) -> DecodeResult<GatewayEvent> {
    if !is_known(event_name) {
        return Err(DecodeError::UnknownEvent(event_name.to_string()));
    }

    let payload = Payload::new(event_name, raw)?;
    let shard = ctx.shard();
    trace!(event = event_name, %shard, "decoding payload");

    let event: GatewayEvent = match event_name {
        "CHANNEL_CREATE" | "CHANNEL_UPDATE" | "CHANNEL_DELETE" => {
            decode_channel_event(&payload, ctx)?
        }
        "CHANNEL_PINS_UPDATE" => {
            let channel_id = payload.required("channel_id")?;
            let last_pin_timestamp = payload.optional_timestamp("last_pin_timestamp")?;
            match payload.optional::<Snowflake>("guild_id")? {
                Some(guild_id) => GuildChannelPinsUpdateEvent {
                    shard,
                    channel_id,
                    guild_id,
                    last_pin_timestamp,
                }
                .into(),
                None => PrivateChannelPinsUpdateEvent {
                    shard,
                    channel_id,
                    last_pin_timestamp,
                }
                .into(),
            }
        }
        "INVITE_CREATE" => InviteCreateEvent {
            shard,
            invite: decode_invite(&payload, ctx)?,
        }
        .into(),
        "INVITE_DELETE" => InviteDeleteEvent {
            shard,
            channel_id: payload.required("channel_id")?,
            guild_id: payload.required("guild_id")?,
            code: payload.required("code")?,
        }
        .into(),
        "WEBHOOKS_UPDATE" => WebhookUpdateEvent {
            shard,
            channel_id: payload.required("channel_id")?,
            guild_id: payload.required("guild_id")?,
        }
        .into(),
        "GUILD_CREATE" => GuildAvailableEvent {
            shard,
            guild: resolve(&payload, |l| l.resolve_guild(raw), ctx)?,
        }
        .into(),
        "GUILD_DELETE" => {
            let guild_id = payload.required("id")?;
            if payload.flag("unavailable")? {
                GuildUnavailableEvent { shard, guild_id }.into()
            } else {
                GuildLeaveEvent { shard, guild_id }.into()
            }
        }
        "GUILD_UPDATE" => GuildUpdateEvent {
            shard,
            guild: resolve(&payload, |l| l.resolve_guild(raw), ctx)?,
        }
        .into(),
        "GUILD_BAN_ADD" => BanCreateEvent {
            shard,
            guild_id: payload.required("guild_id")?,
            user: embedded_user(&payload, "user", ctx)?,
        }
        .into(),
        "GUILD_BAN_REMOVE" => BanDeleteEvent {
            shard,
            guild_id: payload.required("guild_id")?,
            user: embedded_user(&payload, "user", ctx)?,
        }
        .into(),
        "GUILD_EMOJIS_UPDATE" => EmojisUpdateEvent {
            shard,
            guild_id: payload.required("guild_id")?,
            emojis: payload.required::<Vec<KnownCustomEmoji>>("emojis")?,
        }
        .into(),
        "GUILD_INTEGRATIONS_UPDATE" => IntegrationsUpdateEvent {
            shard,
            guild_id: payload.required("guild_id")?,
        }
        .into(),
        "PRESENCE_UPDATE" => PresenceUpdateEvent {
            shard,
            presence: payload.model::<MemberPresence>()?,
            user: decode_user_delta(&payload)?,
        }
        .into(),
        "GUILD_MEMBER_ADD" => MemberCreateEvent {
            shard,
            guild_id: payload.required("guild_id")?,
            member: decode_member(&payload, ctx)?,
        }
        .into(),
        "GUILD_MEMBER_UPDATE" => MemberUpdateEvent {
            shard,
            guild_id: payload.required("guild_id")?,
            member: decode_member(&payload, ctx)?,
        }
        .into(),
        "GUILD_MEMBER_REMOVE" => MemberDeleteEvent {
            shard,
            guild_id: payload.required("guild_id")?,
            user: embedded_user(&payload, "user", ctx)?,
        }
        .into(),
        "READY" => ShardReadyEvent {
            shard,
            gateway_version: payload.required("v")?,
            my_user: embedded_user(&payload, "user", ctx)?,
            unavailable_guilds: payload.required::<Vec<UnavailableGuild>>("guilds")?,
            session_id: payload.required("session_id")?,
        }
        .into(),
        "RESUMED" => ShardResumedEvent { shard }.into(),
        other => return Err(DecodeError::UnknownEvent(other.to_string())),
    };

    Ok(event)
}

// ============================================================================
// Helpers
// ============================================================================

/// Runs a lookup over the top-level payload, attributing failures to the event.
fn resolve<T>(
    payload: &Payload<'_>,
    f: impl FnOnce(&dyn EntityLookup) -> DecodeResult<T>,
    ctx: &DecodeContext,
) -> DecodeResult<T> {
    f(ctx.lookup()).map_err(|e| e.in_event(payload.event()))
}

/// Resolves a required embedded user fragment.
fn embedded_user(
    payload: &Payload<'_>,
    field: &str,
    ctx: &DecodeContext,
) -> DecodeResult<User> {
    let raw = payload.object(field)?;
    resolve(payload, |l| l.resolve_user(raw), ctx)
}

fn decode_channel_event(payload: &Payload<'_>, ctx: &DecodeContext) -> DecodeResult<GatewayEvent> {
    let shard = ctx.shard();
    let channel = resolve(payload, |l| l.resolve_channel(payload.raw()), ctx)?;

    let event: GatewayEvent = match (payload.event(), channel) {
        ("CHANNEL_CREATE", Channel::Guild(channel)) => GuildChannelCreateEvent { shard, channel }.into(),
        ("CHANNEL_UPDATE", Channel::Guild(channel)) => GuildChannelUpdateEvent { shard, channel }.into(),
        ("CHANNEL_DELETE", Channel::Guild(channel)) => GuildChannelDeleteEvent { shard, channel }.into(),
        ("CHANNEL_CREATE", Channel::Private(channel)) => {
            PrivateChannelCreateEvent { shard, channel }.into()
        }
        ("CHANNEL_UPDATE", Channel::Private(channel)) => {
            PrivateChannelUpdateEvent { shard, channel }.into()
        }
        ("CHANNEL_DELETE", Channel::Private(channel)) => {
            PrivateChannelDeleteEvent { shard, channel }.into()
        }
        (_, Channel::Partial(_)) => {
            return Err(DecodeError::missing_field(payload.event(), "guild_id"));
        }
        (other, _) => return Err(DecodeError::UnknownEvent(other.to_string())),
    };
    Ok(event)
}

/// Assembles an invite, resolving embedded fragments through the lookup.
fn decode_invite(payload: &Payload<'_>, ctx: &DecodeContext) -> DecodeResult<Invite> {
    let guild = match payload.optional_object("guild")? {
        Some(raw) => GuildRef::Resolved(Box::new(resolve(payload, |l| l.resolve_guild(raw), ctx)?)),
        None => GuildRef::Id(payload.required("guild_id")?),
    };
    let channel = match payload.optional_object("channel")? {
        Some(raw) => {
            ChannelRef::Resolved(Box::new(resolve(payload, |l| l.resolve_channel(raw), ctx)?))
        }
        None => ChannelRef::Id(payload.required("channel_id")?),
    };
    let inviter = optional_user(payload, "inviter", ctx)?;
    let target_user = optional_user(payload, "target_user", ctx)?;

    let metadata = if payload.has("uses") || payload.has("created_at") {
        Some(payload.model::<InviteMetadata>()?)
    } else {
        None
    };

    Ok(Invite {
        code: payload.required("code")?,
        guild,
        channel,
        inviter,
        target_user,
        target_user_type: payload.optional("target_user_type")?,
        approximate_presence_count: payload.optional("approximate_presence_count")?,
        approximate_member_count: payload.optional("approximate_member_count")?,
        metadata,
    })
}

fn optional_user(
    payload: &Payload<'_>,
    field: &str,
    ctx: &DecodeContext,
) -> DecodeResult<Option<User>> {
    payload
        .optional_object(field)?
        .map(|raw| resolve(payload, |l| l.resolve_user(raw), ctx))
        .transpose()
}

/// Decodes a member whose fields sit at the top level of `payload`.
fn decode_member(payload: &Payload<'_>, ctx: &DecodeContext) -> DecodeResult<Member> {
    Ok(Member {
        user: embedded_user(payload, "user", ctx)?,
        nickname: payload.optional("nick")?,
        role_ids: payload.optional("roles")?.unwrap_or_default(),
        joined_at: payload.timestamp("joined_at")?,
        premium_since: payload.optional_timestamp("premium_since")?,
        deaf: payload.flag("deaf")?,
        mute: payload.flag("mute")?,
    })
}

/// The user fragment of a presence carries a profile delta only when it has
/// fields beyond `id`.
fn decode_user_delta(payload: &Payload<'_>) -> DecodeResult<Option<PartialUser>> {
    let user = payload.object("user")?;
    let has_delta = user
        .as_object()
        .is_some_and(|fields| fields.keys().any(|key| key != "id"));
    if !has_delta {
        return Ok(None);
    }
    PartialUser::deserialize(user)
        .map(Some)
        .map_err(|e| DecodeError::malformed(payload.event(), format!("field `user`: {e}")))
}
