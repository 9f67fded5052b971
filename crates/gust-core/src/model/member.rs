//! Guild member objects.

use serde::{Deserialize, Serialize};

use super::User;
use crate::foundation::{Snowflake, Timestamp, time};

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default, rename = "nick")]
    pub nickname: Option<String>,
    #[serde(default, rename = "roles")]
    pub role_ids: Vec<Snowflake>,
    #[serde(deserialize_with = "time::deserialize")]
    pub joined_at: Timestamp,
    #[serde(default, deserialize_with = "time::option::deserialize")]
    pub premium_since: Option<Timestamp>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
}

impl Member {
    /// The nickname if set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }
}
