//! Gateway intents.
//!
//! Intents are the capability set a client declares when identifying with the
//! gateway. The remote service only transmits the event categories covered by
//! the declared intents, so every listener registration is checked against
//! this set (see [`Requirement`](crate::requirement::Requirement)).
//!
//! ```rust,ignore
//! use gust_core::Intents;
//!
//! let declared = Intents::GUILDS | Intents::GUILD_BANS;
//! assert!(declared.contains(Intents::GUILD_BANS));
//! assert!(Intents::GUILDS.is_subset_of(declared));
//!
//! let parsed: Intents = "GUILDS | GUILD_INVITES".parse()?;
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IntentError;

/// An immutable set of gateway intents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "IntentsRepr", into = "Vec<String>")]
pub struct Intents(u32);

macro_rules! intent_flags {
    ($( $(#[$meta:meta])* $name:ident = $bit:expr ),+ $(,)?) => {
        impl Intents {
            $(
                $(#[$meta])*
                pub const $name: Self = Self(1 << $bit);
            )+

            /// Every defined flag with its wire name, in bit order.
            const FLAGS: &'static [(&'static str, Intents)] = &[
                $( (stringify!($name), Self::$name), )+
            ];
        }
    };
}

intent_flags! {
    /// Guild lifecycle, roles and channel events.
    GUILDS = 0,
    /// Member join/update/leave events. Privileged.
    GUILD_MEMBERS = 1,
    /// Ban and unban events.
    GUILD_BANS = 2,
    /// Custom emoji updates.
    GUILD_EMOJIS = 3,
    /// Integration updates.
    GUILD_INTEGRATIONS = 4,
    /// Webhook updates.
    GUILD_WEBHOOKS = 5,
    /// Invite create/delete events.
    GUILD_INVITES = 6,
    /// Voice state updates.
    GUILD_VOICE_STATES = 7,
    /// Presence updates. Privileged.
    GUILD_PRESENCES = 8,
    /// Guild message events.
    GUILD_MESSAGES = 9,
    /// Guild reaction events.
    GUILD_MESSAGE_REACTIONS = 10,
    /// Guild typing events.
    GUILD_MESSAGE_TYPING = 11,
    /// Private channel and direct message events.
    PRIVATE_MESSAGES = 12,
    /// Direct message reaction events.
    PRIVATE_MESSAGE_REACTIONS = 13,
    /// Direct message typing events.
    PRIVATE_MESSAGE_TYPING = 14,
}

impl Intents {
    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Every defined intent.
    pub const ALL: Self = Self((1 << 15) - 1);

    /// Intents that must be enabled for the application before use.
    pub const PRIVILEGED: Self = Self(Self::GUILD_MEMBERS.0 | Self::GUILD_PRESENCES.0);

    /// Creates a set from raw bits, rejecting undefined bits.
    pub fn from_bits(bits: u32) -> Result<Self, IntentError> {
        if bits & !Self::ALL.0 != 0 {
            Err(IntentError::UndefinedBits(bits & !Self::ALL.0))
        } else {
            Ok(Self(bits))
        }
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if no intent is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every flag of `other` is in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share at least one flag.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns the flags present in either set.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the flags present in both sets.
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns `true` if every flag of `self` is declared in `declared`.
    pub const fn is_subset_of(self, declared: Self) -> bool {
        declared.contains(self)
    }

    /// Returns the privileged flags in this set.
    pub const fn privileged(self) -> Self {
        self.intersection(Self::PRIVILEGED)
    }

    /// Iterates over the individual flags of this set with their names.
    pub fn iter(self) -> impl Iterator<Item = (&'static str, Intents)> {
        Self::FLAGS
            .iter()
            .copied()
            .filter(move |(_, flag)| self.contains(*flag))
    }

    /// Looks up a single flag by its wire name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, IntentError> {
        let name = name.trim();
        Self::FLAGS
            .iter()
            .find(|(flag_name, _)| flag_name.eq_ignore_ascii_case(name))
            .map(|(_, flag)| *flag)
            .ok_or_else(|| IntentError::UnknownFlag(name.to_string()))
    }

    /// Builds a set from a list of flag names.
    pub fn from_names<I, S>(names: I) -> Result<Self, IntentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(Self::NONE, |acc, name| -> Result<Self, IntentError> {
                Ok(acc | Self::from_name(name.as_ref())?)
            })
    }
}

impl BitOr for Intents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Intents {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitAnd for Intents {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl FromIterator<Intents> for Intents {
    fn from_iter<T: IntoIterator<Item = Intents>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NONE, Self::union)
    }
}

impl FromStr for Intents {
    type Err = IntentError;

    /// Parses `"GUILDS | GUILD_BANS"` style expressions. An empty string or
    /// `NONE` yields the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("NONE") {
            return Ok(Self::NONE);
        }
        Self::from_names(s.split(['|', ',']))
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (name, _) in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Intents({self})")
    }
}

/// Accepted serialized forms: raw bits, a single expression, or a list of names.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntentsRepr {
    Bits(u32),
    Expr(String),
    Names(Vec<String>),
}

impl TryFrom<IntentsRepr> for Intents {
    type Error = IntentError;

    fn try_from(repr: IntentsRepr) -> Result<Self, Self::Error> {
        match repr {
            IntentsRepr::Bits(bits) => Self::from_bits(bits),
            IntentsRepr::Expr(expr) => expr.parse(),
            IntentsRepr::Names(names) => Self::from_names(names),
        }
    }
}

impl From<Intents> for Vec<String> {
    fn from(intents: Intents) -> Self {
        intents.iter().map(|(name, _)| name.to_string()).collect()
    }
}
