//! Guild objects.

use serde::{Deserialize, Serialize};

use super::KnownCustomEmoji;
use crate::foundation::Snowflake;

/// A guild as delivered on create/update, or embedded in an invite.
///
/// Invite fragments omit most fields, so everything beyond `id` and `name`
/// is optional or defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
    #[serde(default)]
    pub approximate_presence_count: Option<u64>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub emojis: Vec<KnownCustomEmoji>,
    #[serde(default)]
    pub unavailable: bool,
}

impl Guild {
    /// Returns `true` if the guild advertises the given feature flag.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// A guild that is temporarily unreachable because of an outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableGuild {
    pub id: Snowflake,
    #[serde(default = "unavailable_default")]
    pub unavailable: bool,
}

fn unavailable_default() -> bool {
    true
}
