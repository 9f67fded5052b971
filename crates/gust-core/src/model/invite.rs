//! Invite objects.
//!
//! Invites embed their guild and channel either as resolved fragments or as
//! bare ids (gateway `INVITE_CREATE` payloads only carry ids). The id
//! accessors derive from whichever form is present. Invites are assembled by
//! the decoder so that embedded fragments go through the entity lookup.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{Channel, Guild, User};
use crate::foundation::{Snowflake, Timestamp, time};

/// Kind of target user an invite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TargetUserType {
    Stream,
    Unknown(u8),
}

impl From<u8> for TargetUserType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Stream,
            other => Self::Unknown(other),
        }
    }
}

impl From<TargetUserType> for u8 {
    fn from(kind: TargetUserType) -> Self {
        match kind {
            TargetUserType::Stream => 1,
            TargetUserType::Unknown(other) => other,
        }
    }
}

/// The guild an invite leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GuildRef {
    Resolved(Box<Guild>),
    Id(Snowflake),
}

impl GuildRef {
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Resolved(guild) => guild.id,
            Self::Id(id) => *id,
        }
    }

    pub fn resolved(&self) -> Option<&Guild> {
        match self {
            Self::Resolved(guild) => Some(guild),
            Self::Id(_) => None,
        }
    }
}

/// The channel an invite leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChannelRef {
    Resolved(Box<Channel>),
    Id(Snowflake),
}

impl ChannelRef {
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Resolved(channel) => channel.id(),
            Self::Id(id) => *id,
        }
    }

    pub fn resolved(&self) -> Option<&Channel> {
        match self {
            Self::Resolved(channel) => Some(channel),
            Self::Id(_) => None,
        }
    }
}

/// Usage metadata, present only on invites fetched with metadata or created
/// over the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteMetadata {
    pub uses: u32,
    /// `0` means unlimited.
    pub max_uses: u32,
    /// Lifetime in seconds; `0` means the invite never expires.
    pub max_age: u32,
    pub temporary: bool,
    #[serde(deserialize_with = "time::deserialize")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub revoked: bool,
}

impl InviteMetadata {
    /// When the invite expires, or `None` if it is permanent.
    pub fn expires_at(&self) -> Option<Timestamp> {
        (self.max_age > 0).then(|| self.created_at + Duration::seconds(i64::from(self.max_age)))
    }
}

/// A guild invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invite {
    pub code: String,
    pub guild: GuildRef,
    pub channel: ChannelRef,
    pub inviter: Option<User>,
    pub target_user: Option<User>,
    pub target_user_type: Option<TargetUserType>,
    pub approximate_presence_count: Option<u64>,
    pub approximate_member_count: Option<u64>,
    pub metadata: Option<InviteMetadata>,
}

impl Invite {
    pub fn guild_id(&self) -> Snowflake {
        self.guild.id()
    }

    pub fn channel_id(&self) -> Snowflake {
        self.channel.id()
    }

    /// Returns the shareable invite URL.
    pub fn url(&self) -> String {
        format!("https://discord.gg/{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_expiry() {
        let metadata: InviteMetadata = serde_json::from_value(json!({
            "uses": 0,
            "max_uses": 0,
            "max_age": 3600,
            "temporary": false,
            "created_at": "2016-03-31T19:15:39.954000+00:00"
        }))
        .unwrap();
        let expires = metadata.expires_at().unwrap();
        assert_eq!((expires - metadata.created_at).num_seconds(), 3600);
        assert!(!metadata.revoked);

        let permanent = InviteMetadata { max_age: 0, ..metadata };
        assert!(permanent.expires_at().is_none());
    }

    #[test]
    fn test_refs_derive_ids() {
        let guild = GuildRef::Id(Snowflake::new(7));
        assert_eq!(guild.id(), Snowflake::new(7));
        assert!(guild.resolved().is_none());
        assert_eq!(TargetUserType::from(1), TargetUserType::Stream);
        assert_eq!(TargetUserType::from(9), TargetUserType::Unknown(9));
    }
}
