//! Guild member events.

use super::GuildEvent;
use crate::foundation::{ShardId, Snowflake};
use crate::model::{Member, User};

/// A user joined a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCreateEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
    pub member: Member,
}

/// A member's roles, nickname or boost status changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberUpdateEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
    pub member: Member,
}

/// A user left or was removed from a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeleteEvent {
    pub shard: ShardId,
    pub guild_id: Snowflake,
    pub user: User,
}

impl MemberCreateEvent {
    pub fn user_id(&self) -> Snowflake {
        self.member.user.id
    }
}

impl MemberUpdateEvent {
    pub fn user_id(&self) -> Snowflake {
        self.member.user.id
    }
}

impl MemberDeleteEvent {
    pub fn user_id(&self) -> Snowflake {
        self.user.id
    }
}

impl GuildEvent for MemberCreateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl GuildEvent for MemberUpdateEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl GuildEvent for MemberDeleteEvent {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}
