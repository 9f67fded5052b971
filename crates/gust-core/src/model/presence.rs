//! Presence objects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::foundation::{Snowflake, Timestamp, time};

/// Online status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Idle,
    #[serde(rename = "dnd")]
    DoNotDisturb,
    #[default]
    Offline,
    Invisible,
}

/// Per-platform status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientStatus {
    #[serde(default)]
    pub desktop: Option<Status>,
    #[serde(default)]
    pub mobile: Option<Status>,
    #[serde(default)]
    pub web: Option<Status>,
}

/// A rich presence activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub url: Option<String>,
}

/// A member's presence within one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPresence {
    #[serde(rename = "user", deserialize_with = "user_id_of")]
    pub user_id: Snowflake,
    pub guild_id: Snowflake,
    pub status: Status,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub client_status: ClientStatus,
    #[serde(default, rename = "roles")]
    pub role_ids: Vec<Snowflake>,
    #[serde(default, rename = "nick")]
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "time::option::deserialize")]
    pub premium_since: Option<Timestamp>,
}

/// Reads the `id` out of the embedded `user` fragment.
fn user_id_of<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Snowflake, D::Error> {
    use serde::de::Error;

    let user = Value::deserialize(deserializer)?;
    let id = user.get("id").ok_or_else(|| D::Error::missing_field("user.id"))?;
    Snowflake::deserialize(id).map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence_decodes_user_id_and_renames() {
        let presence: MemberPresence = serde_json::from_value(json!({
            "user": { "id": "115590097100865541" },
            "guild_id": "44004107744407552",
            "status": "dnd",
            "roles": ["1"],
            "nick": "Nick",
            "client_status": { "desktop": "online" },
            "activities": [{ "name": "a game", "type": 0 }]
        }))
        .unwrap();
        assert_eq!(presence.user_id, Snowflake::new(115590097100865541));
        assert_eq!(presence.status, Status::DoNotDisturb);
        assert_eq!(presence.client_status.desktop, Some(Status::Online));
        assert_eq!(presence.nickname.as_deref(), Some("Nick"));
        assert_eq!(presence.activities[0].name, "a game");
    }

    #[test]
    fn test_presence_requires_user_id() {
        let result = serde_json::from_value::<MemberPresence>(json!({
            "user": {},
            "guild_id": "1",
            "status": "online"
        }));
        assert!(result.is_err());
    }
}
