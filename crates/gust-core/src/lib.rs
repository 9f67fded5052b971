//! # Gust Core
//!
//! The event model of the gust gateway client.
//!
//! This crate turns raw gateway payloads into typed events and records which
//! declared capabilities ("intents") each event kind needs.
//!
//! ## Layers
//!
//! ### Foundation
//!
//! Value types shared by everything else:
//! - **Identifiers**: [`Snowflake`] ids transmitted as numeric strings
//! - **Capabilities**: the [`Intents`] bitset declared at identify time
//! - **Shards**: [`ShardId`] and the [`RawDispatch`] feed consumed from the transport
//!
//! ### Model and events
//!
//! - **Models**: users, guilds, channels, invites, emojis, presences, members
//! - **Events**: one record per concrete kind ([`event`]), the [`GatewayEvent`]
//!   union, and family traits such as [`GuildEvent`] and [`ChannelEvent`]
//! - **Requirements**: the [`RequirementTable`] mapping kinds to intents
//!
//! ### Decoding
//!
//! [`decode()`](decode::decode) maps `(event name, payload)` to a
//! [`GatewayEvent`], resolving embedded fragments through an [`EntityLookup`].
//!
//! ```text
//! ┌───────────┐  RawDispatch  ┌─────────┐  GatewayEvent  ┌────────────┐
//! │ Transport │──────────────▶│ decode  │───────────────▶│ Dispatcher │
//! └───────────┘               └─────────┘                └────────────┘
//!                                  │
//!                                  ▼
//!                            EntityLookup
//! ```

pub mod decode;
pub mod error;
pub mod event;
pub mod foundation;
pub mod model;
pub mod requirement;

pub use decode::{DecodeContext, EntityLookup, PassthroughLookup};
pub use error::{DecodeError, DecodeResult, IntentError, SnowflakeError, UnknownEventKind};
pub use event::{
    BanEvent, ChannelEvent, Event, EventContext, EventFamily, EventKind, GatewayEvent, GuildEvent,
    GuildVisibilityEvent, InviteEvent, PinsUpdateEvent,
};
pub use foundation::{GatewayShard, Intents, RawDispatch, ShardFeed, ShardId, Snowflake, Timestamp};
pub use requirement::{Requirement, RequirementTable};

/// Prelude for common imports.
pub mod prelude {
    pub use super::event::*;
    pub use super::foundation::{GatewayShard, Intents, ShardId, Snowflake};
    pub use super::requirement::{Requirement, RequirementTable};
}
