//! Capability requirements of event kinds.
//!
//! The gateway only sends an event kind when the declared [`Intents`] cover
//! it. This module records which intents each kind and family needs, so a
//! listener for an event that can never arrive is rejected at registration
//! time instead of silently never firing.
//!
//! The defaults are static. A few entries are *provisional*: the remote
//! service does not document them, so configuration may override them when
//! building a [`RequirementTable`].

use std::collections::HashMap;
use std::fmt;

use crate::event::{EventFamily, EventKind};
use crate::foundation::Intents;

// ============================================================================
// Requirement
// ============================================================================

/// The intents needed to receive an event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Every flag must be declared.
    AllOf(Intents),
    /// At least one flag must be declared.
    AnyOf(Intents),
    /// Always delivered, regardless of intents.
    Ungated,
}

impl Requirement {
    /// Returns `true` if `declared` lets the gateway send this kind.
    pub fn is_satisfied_by(self, declared: Intents) -> bool {
        match self {
            Self::AllOf(required) => required.is_subset_of(declared),
            Self::AnyOf(options) => options.is_empty() || options.intersects(declared),
            Self::Ungated => true,
        }
    }

    /// The flags mentioned by this requirement.
    pub fn intents(self) -> Intents {
        match self {
            Self::AllOf(intents) | Self::AnyOf(intents) => intents,
            Self::Ungated => Intents::NONE,
        }
    }

    /// Flags of an `AllOf` requirement that `declared` lacks.
    pub fn missing_from(self, declared: Intents) -> Intents {
        match self {
            Self::AllOf(required) => Intents::from_iter(
                required
                    .iter()
                    .filter(|(_, flag)| !declared.contains(*flag))
                    .map(|(_, flag)| flag),
            ),
            Self::AnyOf(options) if !self.is_satisfied_by(declared) => options,
            _ => Intents::NONE,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllOf(intents) => write!(f, "all of [{intents}]"),
            Self::AnyOf(intents) => write!(f, "any of [{intents}]"),
            Self::Ungated => f.write_str("no capability gate"),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

/// Kinds whose requirement is uncertain: private pins are undocumented, and
/// integration updates were historically gated on `GUILD_EMOJIS`.
const PROVISIONAL: &[EventKind] = &[
    EventKind::PrivateChannelPinsUpdate,
    EventKind::IntegrationsUpdate,
];

/// Static requirement of a concrete kind.
pub fn default_requirement(kind: EventKind) -> Requirement {
    use EventKind::*;
    use Requirement::*;

    match kind {
        GuildChannelCreate | GuildChannelUpdate | GuildChannelDelete | GuildChannelPinsUpdate => {
            AllOf(Intents::GUILDS)
        }
        PrivateChannelCreate | PrivateChannelUpdate | PrivateChannelDelete => {
            AllOf(Intents::PRIVATE_MESSAGES)
        }
        PrivateChannelPinsUpdate => AllOf(Intents::PRIVATE_MESSAGES),
        InviteCreate | InviteDelete => AllOf(Intents::GUILD_INVITES),
        WebhookUpdate => AllOf(Intents::GUILD_WEBHOOKS),
        GuildAvailable | GuildUnavailable | GuildLeave | GuildUpdate => AllOf(Intents::GUILDS),
        BanCreate | BanDelete => AllOf(Intents::GUILD_BANS),
        EmojisUpdate => AllOf(Intents::GUILD_EMOJIS),
        IntegrationsUpdate => AllOf(Intents::GUILD_INTEGRATIONS),
        PresenceUpdate => AllOf(Intents::GUILD_PRESENCES),
        MemberCreate | MemberUpdate | MemberDelete => AllOf(Intents::GUILD_MEMBERS),
        ShardReady | ShardResumed => Ungated,
    }
}

/// Static requirement of a family.
pub fn family_requirement(family: EventFamily) -> Requirement {
    use Requirement::*;

    match family {
        EventFamily::Shard => Ungated,
        EventFamily::Channel
        | EventFamily::ChannelCreate
        | EventFamily::ChannelUpdate
        | EventFamily::ChannelDelete
        | EventFamily::ChannelPinsUpdate => AnyOf(Intents::GUILDS | Intents::PRIVATE_MESSAGES),
        EventFamily::GuildChannel => AllOf(Intents::GUILDS),
        EventFamily::PrivateChannel => AllOf(Intents::PRIVATE_MESSAGES),
        EventFamily::Invite => AllOf(Intents::GUILD_INVITES),
        EventFamily::GuildVisibility | EventFamily::Guild => AllOf(Intents::GUILDS),
        EventFamily::Ban => AllOf(Intents::GUILD_BANS),
        EventFamily::Member => AllOf(Intents::GUILD_MEMBERS),
    }
}

// ============================================================================
// Requirement Table
// ============================================================================

/// Requirement lookup for every kind, with configuration-time overrides.
///
/// The table is built once while configuring a client and is read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementTable {
    overrides: HashMap<EventKind, Requirement>,
}

impl RequirementTable {
    /// A table with only the static defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a table where `kind` requires `requirement`.
    pub fn with_override(mut self, kind: EventKind, requirement: Requirement) -> Self {
        self.overrides.insert(kind, requirement);
        self
    }

    /// The requirement of a concrete kind.
    pub fn required_capabilities(&self, kind: EventKind) -> Requirement {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_requirement(kind))
    }

    /// The requirement of a family.
    pub fn family_requirement(&self, family: EventFamily) -> Requirement {
        family_requirement(family)
    }

    /// Returns `true` if the default for `kind` is unconfirmed.
    pub fn is_provisional(&self, kind: EventKind) -> bool {
        PROVISIONAL.contains(&kind)
    }

    /// Returns `true` if configuration replaced the default for `kind`.
    pub fn is_overridden(&self, kind: EventKind) -> bool {
        self.overrides.contains_key(&kind)
    }

    /// Iterates over every kind with its effective requirement.
    pub fn iter(&self) -> impl Iterator<Item = (EventKind, Requirement)> + '_ {
        EventKind::ALL
            .iter()
            .map(|kind| (*kind, self.required_capabilities(*kind)))
    }

    /// The smallest intent set under which every `kinds` entry is deliverable.
    ///
    /// `AnyOf` requirements contribute their lowest flag.
    pub fn intents_for(&self, kinds: impl IntoIterator<Item = EventKind>) -> Intents {
        kinds
            .into_iter()
            .map(|kind| match self.required_capabilities(kind) {
                Requirement::AllOf(intents) => intents,
                Requirement::AnyOf(intents) => {
                    intents.iter().next().map(|(_, flag)| flag).unwrap_or_default()
                }
                Requirement::Ungated => Intents::NONE,
            })
            .collect()
    }
}
