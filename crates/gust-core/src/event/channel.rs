//! Channel, pin, invite and webhook events.
//!
//! Channel lifecycle events are split into guild and private siblings at the
//! type level: only the guild variants implement [`GuildEvent`].

use super::{ChannelEvent, GuildEvent, InviteEvent, PinsUpdateEvent};
use crate::foundation::{ShardId, Snowflake, Timestamp};
use crate::model::{GuildChannel, Invite, PrivateChannel};

// ============================================================================
// Guild channel lifecycle
// ============================================================================

/// A channel was created in a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildChannelCreateEvent {
    pub shard: ShardId,
    pub channel: GuildChannel,
}

/// A guild channel was updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildChannelUpdateEvent {
    pub shard: ShardId,
    pub channel: GuildChannel,
}

/// A guild channel was deleted. The wire still supplies the removed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildChannelDeleteEvent {
    pub shard: ShardId,
    pub channel: GuildChannel,
}

macro_rules! guild_channel_facets {
    ($($ty:ty),+) => {$(
        impl ChannelEvent for $ty {
            fn channel_id(&self) -> Snowflake {
                self.channel.id
            }
        }

        impl GuildEvent for $ty {
            fn guild_id(&self) -> Snowflake {
                self.channel.guild_id
            }
        }
    )+};
}

guild_channel_facets!(
    GuildChannelCreateEvent,
    GuildChannelUpdateEvent,
    GuildChannelDeleteEvent
);

// ============================================================================
// Private channel lifecycle
// ============================================================================

/// A direct message channel was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateChannelCreateEvent {
    pub shard: ShardId,
    pub channel: PrivateChannel,
}

/// A direct message channel was updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateChannelUpdateEvent {
    pub shard: ShardId,
    pub channel: PrivateChannel,
}

/// A direct message channel was closed.
///
/// The gateway is not known to ever send this; it is decoded when it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateChannelDeleteEvent {
    pub shard: ShardId,
    pub channel: PrivateChannel,
}

macro_rules! private_channel_facets {
    ($($ty:ty),+) => {$(
        impl ChannelEvent for $ty {
            fn channel_id(&self) -> Snowflake {
                self.channel.id
            }
        }
    )+};
}

private_channel_facets!(
    PrivateChannelCreateEvent,
    PrivateChannelUpdateEvent,
    PrivateChannelDeleteEvent
);

// ============================================================================
// Pins
// ============================================================================

/// A message was pinned or unpinned in a guild channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildChannelPinsUpdateEvent {
    pub shard: ShardId,
    pub channel_id: Snowflake,
    pub guild_id: Snowflake,
    /// `None` when the last pin was removed.
    pub last_pin_timestamp: Option<Timestamp>,
}

impl ChannelEvent for GuildChannelPinsUpdateEvent {
    fn channel_id(&self) -> Snowflake {
        self.channel_id
    }
}

impl GuildEvent for GuildChannelPinsUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl PinsUpdateEvent for GuildChannelPinsUpdateEvent {
    fn last_pin_timestamp(&self) -> Option<Timestamp> {
        self.last_pin_timestamp
    }
}

/// A message was pinned or unpinned in a private channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateChannelPinsUpdateEvent {
    pub shard: ShardId,
    pub channel_id: Snowflake,
    pub last_pin_timestamp: Option<Timestamp>,
}

impl ChannelEvent for PrivateChannelPinsUpdateEvent {
    fn channel_id(&self) -> Snowflake {
        self.channel_id
    }
}

impl PinsUpdateEvent for PrivateChannelPinsUpdateEvent {
    fn last_pin_timestamp(&self) -> Option<Timestamp> {
        self.last_pin_timestamp
    }
}

// ============================================================================
// Invites
// ============================================================================

/// An invite was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCreateEvent {
    pub shard: ShardId,
    pub invite: Invite,
}

impl ChannelEvent for InviteCreateEvent {
    fn channel_id(&self) -> Snowflake {
        self.invite.channel_id()
    }
}

impl GuildEvent for InviteCreateEvent {
    fn guild_id(&self) -> Snowflake {
        self.invite.guild_id()
    }
}

impl InviteEvent for InviteCreateEvent {
    fn code(&self) -> &str {
        &self.invite.code
    }
}

/// An invite was deleted or expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteDeleteEvent {
    pub shard: ShardId,
    pub channel_id: Snowflake,
    pub guild_id: Snowflake,
    pub code: String,
}

impl ChannelEvent for InviteDeleteEvent {
    fn channel_id(&self) -> Snowflake {
        self.channel_id
    }
}

impl GuildEvent for InviteDeleteEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl InviteEvent for InviteDeleteEvent {
    fn code(&self) -> &str {
        &self.code
    }
}

// ============================================================================
// Webhooks
// ============================================================================

/// Something about a channel's webhooks changed. The gateway does not say what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookUpdateEvent {
    pub shard: ShardId,
    pub channel_id: Snowflake,
    pub guild_id: Snowflake,
}

impl ChannelEvent for WebhookUpdateEvent {
    fn channel_id(&self) -> Snowflake {
        self.channel_id
    }
}

impl GuildEvent for WebhookUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}
