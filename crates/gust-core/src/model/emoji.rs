//! Custom emoji objects.

use serde::{Deserialize, Serialize};

use super::User;
use crate::foundation::Snowflake;

fn default_true() -> bool {
    true
}

/// A custom emoji known to belong to a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCustomEmoji {
    pub id: Snowflake,
    /// `None` for emojis that were deleted.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "roles")]
    pub role_ids: Vec<Snowflake>,
    /// The creator; only sent with the `MANAGE_EMOJIS` permission.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default = "default_true")]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default = "default_true")]
    pub available: bool,
}

impl KnownCustomEmoji {
    /// Returns the chat mention form, e.g. `<a:name:id>`.
    pub fn mention(&self) -> String {
        let prefix = if self.animated { "a" } else { "" };
        format!("<{prefix}:{}:{}>", self.name.as_deref().unwrap_or("_"), self.id)
    }
}
