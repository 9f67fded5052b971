//! # Gust
//!
//! Typed events and capability-checked dispatch for a real-time chat gateway
//! client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  RawDispatch  ┌──────────┐  GatewayEvent  ┌────────────┐
//! │ Shard 0  │──────────────▶│ Pump 0   │───────────────▶│            │──▶ listener #1
//! └──────────┘               │ (decode) │                │ Dispatcher │──▶ listener #2
//! ┌──────────┐               ├──────────┤                │            │──▶ ...
//! │ Shard 1  │──────────────▶│ Pump 1   │───────────────▶│            │
//! └──────────┘               └──────────┘                └─────┬──────┘
//!                                                              └──▶ diagnostics
//! ```
//!
//! - **Core** (`gust-core`): intents, models, the event hierarchy, the
//!   requirement table and the payload decoder
//! - **Framework** (`gust-framework`): dispatcher, listeners, shard pumps
//! - **Runtime** (`gust-runtime`): configuration, logging and [`GustClient`](runtime::GustClient)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gust::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GustClient::new()?;
//!
//!     client.dispatcher().subscribe(|event: EventContext<InviteCreateEvent>| {
//!         info!(code = %event.invite.code, guild = %event.guild_id(), "invite created");
//!     })?;
//!
//!     client.attach_shard(ShardId::new(0), transport.feed(0))?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use gust_core as core;
pub use gust_framework as framework;
pub use gust_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use gust_runtime::{ClientBuilder, GustClient};

    pub use gust_framework::prelude::*;
    pub use gust_framework::{Diagnostic, DispatchError, Listener, SubscriptionHandle};

    pub use gust_core::model::{
        Channel, ChannelType, Guild, GuildChannel, Invite, KnownCustomEmoji, Member,
        MemberPresence, PartialUser, PrivateChannel, Status, User,
    };

    pub use gust_runtime::prelude::*;
}
