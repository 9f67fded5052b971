//! Typed gateway events.
//!
//! This module provides the event hierarchy:
//!
//! - [`Event`] - Base trait implemented by every concrete event kind
//! - [`EventKind`] - Flat enumeration of concrete kinds
//! - [`GatewayEvent`] - Tagged union of all kinds, cheap to clone
//! - [`EventFamily`] - Abstract groups of kinds that share a contract
//! - [`EventContext<E>`] - Wrapper handed to typed listeners
//!
//! # Families as traits
//!
//! Abstract groupings are expressed as trait contracts rather than
//! inheritance. An event that belongs to a guild implements [`GuildEvent`];
//! private channel events simply do not, so asking a private event for its
//! guild is a compile error rather than a `None`.
//!
//! ```rust,ignore
//! use gust_core::event::{ChannelEvent, GuildEvent, InviteCreateEvent};
//!
//! fn describe(event: &InviteCreateEvent) -> String {
//!     format!("{} in {}/{}", event.code(), event.guild_id(), event.channel_id())
//! }
//! ```

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::UnknownEventKind;
use crate::foundation::{ShardId, Snowflake, Timestamp};
use crate::model::User;

pub mod channel;
pub mod guild;
pub mod member;
pub mod shard;

pub use channel::*;
pub use guild::*;
pub use member::*;
pub use shard::*;

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for every concrete event kind.
///
/// Implementations are generated alongside [`GatewayEvent`]; each kind is a
/// closed record produced only by the decoder.
pub trait Event: fmt::Debug + Send + Sync + Sized + 'static {
    /// The concrete kind of this event.
    const KIND: EventKind;

    /// The shard this event arrived on.
    fn shard(&self) -> ShardId;

    /// Borrows this kind out of a [`GatewayEvent`], if it matches.
    fn from_gateway(event: &GatewayEvent) -> Option<&Arc<Self>>;

    /// Wraps this event into the tagged union.
    fn into_gateway(self: Arc<Self>) -> GatewayEvent;
}

// ============================================================================
// Family Contracts
// ============================================================================

/// An event associated with a channel.
pub trait ChannelEvent: Event {
    fn channel_id(&self) -> Snowflake;
}

/// An event scoped to a guild.
pub trait GuildEvent: Event {
    fn guild_id(&self) -> Snowflake;
}

/// An invite was created or deleted.
pub trait InviteEvent: ChannelEvent + GuildEvent {
    /// The invite code.
    fn code(&self) -> &str;
}

/// The pinned messages of a channel changed.
pub trait PinsUpdateEvent: ChannelEvent {
    /// When the most recent pin was made, or `None` if nothing is pinned.
    fn last_pin_timestamp(&self) -> Option<Timestamp>;
}

/// A ban was added or removed.
pub trait BanEvent: GuildEvent {
    fn user(&self) -> &User;
}

/// The bot's view of a guild changed (available, unavailable, or left).
pub trait GuildVisibilityEvent: GuildEvent {}

// ============================================================================
// Kind Registry
// ============================================================================

macro_rules! gateway_events {
    ($( $(#[$meta:meta])* $variant:ident($ty:ty) ),+ $(,)?) => {
        /// The concrete kind of an event.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum EventKind {
            $( $(#[$meta])* $variant, )+
        }

        impl EventKind {
            /// Every concrete kind.
            pub const ALL: &'static [EventKind] = &[$( EventKind::$variant, )+];

            /// Stable name of this kind.
            pub const fn name(self) -> &'static str {
                match self {
                    $( EventKind::$variant => stringify!($variant), )+
                }
            }
        }

        /// A decoded event of any kind.
        ///
        /// Each variant shares its payload through an `Arc`, so cloning the
        /// event for several listeners never copies the payload.
        #[derive(Debug, Clone)]
        pub enum GatewayEvent {
            $( $variant(Arc<$ty>), )+
        }

        impl GatewayEvent {
            /// The concrete kind of this event.
            pub fn kind(&self) -> EventKind {
                match self {
                    $( GatewayEvent::$variant(_) => EventKind::$variant, )+
                }
            }

            /// The shard this event arrived on.
            pub fn shard(&self) -> ShardId {
                match self {
                    $( GatewayEvent::$variant(event) => event.shard, )+
                }
            }
        }

        $(
            impl Event for $ty {
                const KIND: EventKind = EventKind::$variant;

                fn shard(&self) -> ShardId {
                    self.shard
                }

                fn from_gateway(event: &GatewayEvent) -> Option<&Arc<Self>> {
                    match event {
                        GatewayEvent::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_gateway(self: Arc<Self>) -> GatewayEvent {
                    GatewayEvent::$variant(self)
                }
            }

            impl From<$ty> for GatewayEvent {
                fn from(event: $ty) -> Self {
                    GatewayEvent::$variant(Arc::new(event))
                }
            }
        )+
    };
}

gateway_events! {
    GuildChannelCreate(GuildChannelCreateEvent),
    GuildChannelUpdate(GuildChannelUpdateEvent),
    GuildChannelDelete(GuildChannelDeleteEvent),
    GuildChannelPinsUpdate(GuildChannelPinsUpdateEvent),
    PrivateChannelCreate(PrivateChannelCreateEvent),
    PrivateChannelUpdate(PrivateChannelUpdateEvent),
    /// May never be sent by the gateway.
    PrivateChannelDelete(PrivateChannelDeleteEvent),
    PrivateChannelPinsUpdate(PrivateChannelPinsUpdateEvent),
    InviteCreate(InviteCreateEvent),
    InviteDelete(InviteDeleteEvent),
    WebhookUpdate(WebhookUpdateEvent),
    GuildAvailable(GuildAvailableEvent),
    GuildUnavailable(GuildUnavailableEvent),
    GuildLeave(GuildLeaveEvent),
    GuildUpdate(GuildUpdateEvent),
    BanCreate(BanCreateEvent),
    BanDelete(BanDeleteEvent),
    EmojisUpdate(EmojisUpdateEvent),
    IntegrationsUpdate(IntegrationsUpdateEvent),
    PresenceUpdate(PresenceUpdateEvent),
    MemberCreate(MemberCreateEvent),
    MemberUpdate(MemberUpdateEvent),
    MemberDelete(MemberDeleteEvent),
    ShardReady(ShardReadyEvent),
    ShardResumed(ShardResumedEvent),
}

/// Lowercases and strips separators so `guild_update` matches `GuildUpdate`.
fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl EventKind {
    /// The families this kind belongs to.
    pub fn families(self) -> Vec<EventFamily> {
        EventFamily::ALL
            .iter()
            .copied()
            .filter(|family| family.kinds().contains(&self))
            .collect()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .iter()
            .copied()
            .find(|kind| normalise(kind.name()) == wanted)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

// ============================================================================
// Gateway Event Accessors
// ============================================================================

impl GatewayEvent {
    /// Stable name of this event's kind.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Borrows the event as a concrete kind.
    pub fn downcast<E: Event>(&self) -> Option<&Arc<E>> {
        E::from_gateway(self)
    }

    /// The channel this event concerns, for channel events.
    pub fn channel_id(&self) -> Option<Snowflake> {
        match self {
            Self::GuildChannelCreate(e) => Some(e.channel_id()),
            Self::GuildChannelUpdate(e) => Some(e.channel_id()),
            Self::GuildChannelDelete(e) => Some(e.channel_id()),
            Self::GuildChannelPinsUpdate(e) => Some(e.channel_id()),
            Self::PrivateChannelCreate(e) => Some(e.channel_id()),
            Self::PrivateChannelUpdate(e) => Some(e.channel_id()),
            Self::PrivateChannelDelete(e) => Some(e.channel_id()),
            Self::PrivateChannelPinsUpdate(e) => Some(e.channel_id()),
            Self::InviteCreate(e) => Some(e.channel_id()),
            Self::InviteDelete(e) => Some(e.channel_id()),
            Self::WebhookUpdate(e) => Some(e.channel_id()),
            _ => None,
        }
    }

    /// The guild this event concerns, for guild-scoped events.
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::GuildChannelCreate(e) => Some(e.guild_id()),
            Self::GuildChannelUpdate(e) => Some(e.guild_id()),
            Self::GuildChannelDelete(e) => Some(e.guild_id()),
            Self::GuildChannelPinsUpdate(e) => Some(e.guild_id()),
            Self::InviteCreate(e) => Some(e.guild_id()),
            Self::InviteDelete(e) => Some(e.guild_id()),
            Self::WebhookUpdate(e) => Some(e.guild_id()),
            Self::GuildAvailable(e) => Some(e.guild_id()),
            Self::GuildUnavailable(e) => Some(e.guild_id()),
            Self::GuildLeave(e) => Some(e.guild_id()),
            Self::GuildUpdate(e) => Some(e.guild_id()),
            Self::BanCreate(e) => Some(e.guild_id()),
            Self::BanDelete(e) => Some(e.guild_id()),
            Self::EmojisUpdate(e) => Some(e.guild_id()),
            Self::IntegrationsUpdate(e) => Some(e.guild_id()),
            Self::PresenceUpdate(e) => Some(e.guild_id()),
            Self::MemberCreate(e) => Some(e.guild_id()),
            Self::MemberUpdate(e) => Some(e.guild_id()),
            Self::MemberDelete(e) => Some(e.guild_id()),
            _ => None,
        }
    }
}

// ============================================================================
// Families
// ============================================================================

/// An abstract group of event kinds sharing a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    Shard,
    Channel,
    GuildChannel,
    PrivateChannel,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    ChannelPinsUpdate,
    Invite,
    GuildVisibility,
    Guild,
    Ban,
    Member,
}

impl EventFamily {
    /// Every family.
    pub const ALL: &'static [EventFamily] = &[
        Self::Shard,
        Self::Channel,
        Self::GuildChannel,
        Self::PrivateChannel,
        Self::ChannelCreate,
        Self::ChannelUpdate,
        Self::ChannelDelete,
        Self::ChannelPinsUpdate,
        Self::Invite,
        Self::GuildVisibility,
        Self::Guild,
        Self::Ban,
        Self::Member,
    ];

    /// The concrete kinds in this family.
    pub fn kinds(self) -> &'static [EventKind] {
        use EventKind::*;

        match self {
            Self::Shard => &[ShardReady, ShardResumed],
            Self::Channel => &[
                GuildChannelCreate,
                GuildChannelUpdate,
                GuildChannelDelete,
                GuildChannelPinsUpdate,
                PrivateChannelCreate,
                PrivateChannelUpdate,
                PrivateChannelDelete,
                PrivateChannelPinsUpdate,
                InviteCreate,
                InviteDelete,
                WebhookUpdate,
            ],
            Self::GuildChannel => &[
                GuildChannelCreate,
                GuildChannelUpdate,
                GuildChannelDelete,
                GuildChannelPinsUpdate,
                InviteCreate,
                InviteDelete,
                WebhookUpdate,
            ],
            Self::PrivateChannel => &[
                PrivateChannelCreate,
                PrivateChannelUpdate,
                PrivateChannelDelete,
                PrivateChannelPinsUpdate,
            ],
            Self::ChannelCreate => &[GuildChannelCreate, PrivateChannelCreate],
            Self::ChannelUpdate => &[GuildChannelUpdate, PrivateChannelUpdate],
            Self::ChannelDelete => &[GuildChannelDelete, PrivateChannelDelete],
            Self::ChannelPinsUpdate => &[GuildChannelPinsUpdate, PrivateChannelPinsUpdate],
            Self::Invite => &[InviteCreate, InviteDelete],
            Self::GuildVisibility => &[GuildAvailable, GuildUnavailable, GuildLeave],
            Self::Guild => &[
                GuildAvailable,
                GuildUnavailable,
                GuildLeave,
                GuildUpdate,
                BanCreate,
                BanDelete,
                EmojisUpdate,
                IntegrationsUpdate,
                PresenceUpdate,
            ],
            Self::Ban => &[BanCreate, BanDelete],
            Self::Member => &[MemberCreate, MemberUpdate, MemberDelete],
        }
    }

    /// Returns `true` if `kind` is a member of this family.
    pub fn contains(self, kind: EventKind) -> bool {
        self.kinds().contains(&kind)
    }
}

impl fmt::Display for EventFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ============================================================================
// Event Context
// ============================================================================

/// Shared handle to a typed event, handed to typed listeners.
///
/// Use `Deref` to access fields directly on the wrapped event.
///
/// ```rust,ignore
/// dispatcher.subscribe(|event: EventContext<BanCreateEvent>| {
///     println!("{} banned in {}", event.user.tag(), event.guild_id());
/// })?;
/// ```
pub struct EventContext<E> {
    event: Arc<E>,
}

impl<E> EventContext<E> {
    /// Wraps a shared event.
    pub fn new(event: Arc<E>) -> Self {
        Self { event }
    }

    /// Returns the shared event.
    pub fn into_inner(self) -> Arc<E> {
        self.event
    }
}

impl<E: Event> EventContext<E> {
    /// Returns the event as a [`GatewayEvent`].
    pub fn to_gateway(&self) -> GatewayEvent {
        Arc::clone(&self.event).into_gateway()
    }
}

impl<E> Clone for EventContext<E> {
    fn clone(&self) -> Self {
        Self {
            event: Arc::clone(&self.event),
        }
    }
}

impl<E> Deref for EventContext<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

impl<E: fmt::Debug> fmt::Debug for EventContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("event", &self.event)
            .finish()
    }
}
