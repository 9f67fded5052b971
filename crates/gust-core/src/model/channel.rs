//! Channel objects.
//!
//! The wire carries a single channel shape discriminated by `type`. It is
//! decoded into one of three variants:
//!
//! - [`Channel::Private`] for DM and group DM types
//! - [`Channel::Guild`] for guild types carrying a `guild_id`
//! - [`Channel::Partial`] for guild types without `guild_id` (invite fragments)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::User;
use crate::foundation::{Snowflake, Timestamp, time};

// ============================================================================
// Channel type
// ============================================================================

/// The wire channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildNews,
    GuildStore,
    Unknown(u8),
}

impl ChannelType {
    /// Returns `true` for direct message and group DM channels.
    pub fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

impl From<u8> for ChannelType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildNews,
            6 => Self::GuildStore,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        match kind {
            ChannelType::GuildText => 0,
            ChannelType::Dm => 1,
            ChannelType::GuildVoice => 2,
            ChannelType::GroupDm => 3,
            ChannelType::GuildCategory => 4,
            ChannelType::GuildNews => 5,
            ChannelType::GuildStore => 6,
            ChannelType::Unknown(other) => other,
        }
    }
}

// ============================================================================
// Channel variants
// ============================================================================

/// A channel that belongs to a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildChannel {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub name: String,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub last_message_id: Option<Snowflake>,
    #[serde(default, deserialize_with = "time::option::deserialize")]
    pub last_pin_timestamp: Option<Timestamp>,
}

/// A direct message or group DM channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateChannel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub recipients: Vec<User>,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub last_message_id: Option<Snowflake>,
    #[serde(default, deserialize_with = "time::option::deserialize")]
    pub last_pin_timestamp: Option<Timestamp>,
}

/// A channel fragment, as embedded in invites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialChannel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub name: Option<String>,
}

/// Any channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Channel {
    Guild(GuildChannel),
    Private(PrivateChannel),
    Partial(PartialChannel),
}

impl Channel {
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Guild(c) => c.id,
            Self::Private(c) => c.id,
            Self::Partial(c) => c.id,
        }
    }

    pub fn kind(&self) -> ChannelType {
        match self {
            Self::Guild(c) => c.kind,
            Self::Private(c) => c.kind,
            Self::Partial(c) => c.kind,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Guild(c) => Some(&c.name),
            Self::Private(c) => c.name.as_deref(),
            Self::Partial(c) => c.name.as_deref(),
        }
    }

    /// The owning guild, if this is a guild channel.
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::Guild(c) => Some(c.guild_id),
            _ => None,
        }
    }

    pub fn as_guild(&self) -> Option<&GuildChannel> {
        match self {
            Self::Guild(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_private(&self) -> Option<&PrivateChannel> {
        match self {
            Self::Private(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_guild(self) -> Option<GuildChannel> {
        match self {
            Self::Guild(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_private(self) -> Option<PrivateChannel> {
        match self {
            Self::Private(c) => Some(c),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .ok_or_else(|| D::Error::missing_field("type"))
            .and_then(|v| ChannelType::deserialize(v).map_err(D::Error::custom))?;

        if kind.is_private() {
            serde_json::from_value(value)
                .map(Self::Private)
                .map_err(D::Error::custom)
        } else if value.get("guild_id").is_some_and(|v| !v.is_null()) {
            serde_json::from_value(value)
                .map(Self::Guild)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Self::Partial)
                .map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_private_channel_variant() {
        let channel: Channel = serde_json::from_value(json!({
            "id": "319674150115610528",
            "type": 1,
            "last_message_id": "3343820033257021450",
            "recipients": [{ "id": "82198898841029460", "username": "test", "discriminator": "9999" }]
        }))
        .unwrap();
        let private = channel.as_private().unwrap();
        assert_eq!(private.recipients.len(), 1);
        assert_eq!(channel.guild_id(), None);
    }

    #[test]
    fn test_guild_channel_variant() {
        let channel: Channel = serde_json::from_value(json!({
            "id": "41771983423143937",
            "guild_id": "41771983423143937",
            "name": "general",
            "type": 0,
            "position": 6,
            "nsfw": true,
            "last_pin_timestamp": "2020-01-01T00:00:00+00:00"
        }))
        .unwrap();
        let guild = channel.as_guild().unwrap();
        assert_eq!(guild.kind, ChannelType::GuildText);
        assert!(guild.nsfw);
        assert!(guild.last_pin_timestamp.is_some());
        assert_eq!(channel.guild_id(), Some(Snowflake::new(41771983423143937)));
    }

    #[test]
    fn test_partial_channel_variant() {
        let channel: Channel =
            serde_json::from_value(json!({ "id": "1", "name": "lobby", "type": 2 })).unwrap();
        assert!(matches!(channel, Channel::Partial(_)));
        assert_eq!(channel.kind(), ChannelType::GuildVoice);
        assert_eq!(channel.name(), Some("lobby"));
    }

    #[test]
    fn test_unknown_channel_type() {
        assert_eq!(ChannelType::from(42), ChannelType::Unknown(42));
        assert_eq!(u8::from(ChannelType::Unknown(42)), 42);
    }

    #[test]
    fn test_missing_type_rejected() {
        assert!(serde_json::from_value::<Channel>(json!({ "id": "1" })).is_err());
    }
}
