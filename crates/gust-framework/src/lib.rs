//! Dispatch layer for the gust gateway client.
//!
//! This crate sits between the decoder in `gust-core` and user code:
//!
//! - [`Dispatcher`]: the subscription registry and delivery loop
//! - [`Listener`]: erased sync or async listener closures
//! - [`ShardPump`]: drives one shard's raw feed through decode and dispatch
//! - [`Diagnostic`]: non-fatal failures published on a broadcast channel
//!
//! # Example
//!
//! ```rust,ignore
//! use gust_framework::prelude::*;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.configure(Intents::GUILDS, RequirementTable::new())?;
//!
//! dispatcher.subscribe(|event: EventContext<GuildLeaveEvent>| {
//!     println!("left {}", event.guild_id);
//! })?;
//!
//! dispatcher.start()?;
//! let pump = ShardPump::new(dispatcher.clone(), DecodeContext::new(ShardId::new(0)));
//! let stats = pump.run(feed).await;
//! ```

pub mod diagnostic;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod pump;
pub mod subscription;

pub use diagnostic::{Diagnostic, FailureCause, ListenerFailure};
pub use dispatcher::{DEFAULT_DIAGNOSTICS_CAPACITY, Dispatcher, DispatcherState};
pub use error::{DispatchError, DispatchResult};
pub use listener::{BoxFuture, IntoListenerResult, Listener, ListenerResult, Predicate};
pub use pump::{PumpStats, ShardPump};
pub use subscription::{SubscriptionHandle, SubscriptionId};

pub mod prelude {
    pub use gust_core::prelude::*;
    pub use gust_core::DecodeContext;

    pub use crate::{
        Diagnostic, DispatchError, Dispatcher, Listener, ShardPump, SubscriptionHandle,
    };
}
