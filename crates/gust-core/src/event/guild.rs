//! Guild-scoped events: visibility, updates, bans, emojis, integrations and
//! presences.

use super::{BanEvent, GuildEvent, GuildVisibilityEvent};
use crate::foundation::{ShardId, Snowflake};
use crate::model::{Guild, KnownCustomEmoji, MemberPresence, PartialUser, User};

// ============================================================================
// Visibility
// ============================================================================

/// A guild became available, either on startup or after an outage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildAvailableEvent {
    pub shard: ShardId,
    pub guild: Guild,
}

impl GuildEvent for GuildAvailableEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild.id
    }
}

impl GuildVisibilityEvent for GuildAvailableEvent {}

/// A guild became unavailable because of an outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildUnavailableEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
}

/// The bot left the guild, was kicked, or the guild was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuildLeaveEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
}

impl GuildEvent for GuildUnavailableEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl GuildVisibilityEvent for GuildUnavailableEvent {}

impl GuildEvent for GuildLeaveEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl GuildVisibilityEvent for GuildLeaveEvent {}

// ============================================================================
// Updates
// ============================================================================

/// A guild's settings changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildUpdateEvent {
    pub shard: ShardId,
    pub guild: Guild,
}

impl GuildEvent for GuildUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild.id
    }
}

// ============================================================================
// Bans
// ============================================================================

/// A user was banned from a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanCreateEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
    pub user: User,
}

/// A user was unbanned from a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanDeleteEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
    pub user: User,
}

macro_rules! ban_facets {
    ($($ty:ty),+) => {$(
        impl GuildEvent for $ty {
            fn guild_id(&self) -> Snowflake {
                self.guild_id
            }
        }

        impl BanEvent for $ty {
            fn user(&self) -> &User {
                &self.user
            }
        }
    )+};
}

ban_facets!(BanCreateEvent, BanDeleteEvent);

// ============================================================================
// Emojis and integrations
// ============================================================================

/// The guild's custom emoji set changed. Carries the complete new set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojisUpdateEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
    pub emojis: Vec<KnownCustomEmoji>,
}

impl GuildEvent for EmojisUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

/// A guild's integrations changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationsUpdateEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
}

impl GuildEvent for IntegrationsUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

// ============================================================================
// Presences
// ============================================================================

/// A member's presence changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdateEvent {
    pub shard: ShardId,
    pub presence: MemberPresence,
    /// The user's profile delta, present only when the user object itself
    /// changed rather than just their guild-level state.
    pub user: Option<PartialUser>,
}

impl PresenceUpdateEvent {
    pub fn user_id(&self) -> Snowflake {
        self.presence.user_id
    }
}

impl GuildEvent for PresenceUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.presence.guild_id
    }
}
