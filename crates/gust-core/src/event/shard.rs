//! Shard lifecycle events. These are never gated by intents.

use crate::foundation::ShardId;
use crate::model::{UnavailableGuild, User};

/// The shard finished identifying and is ready to receive events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardReadyEvent {
    pub shard: ShardId,
    pub gateway_version: u8,
    /// The bot's own user.
    pub my_user: User,
    /// Guilds that will arrive as `GuildAvailable` events once they load.
    pub unavailable_guilds: Vec<UnavailableGuild>,
    pub session_id: String,
}

/// The shard resumed a dropped session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardResumedEvent {
    pub shard: ShardId,
}
