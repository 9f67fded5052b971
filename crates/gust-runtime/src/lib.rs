//! Gust Runtime - configuration, logging and client orchestration.
//!
//! This crate provides:
//! - Layered configuration through figment (`config`)
//! - `tracing-subscriber` initialisation (`logging`)
//! - [`GustClient`], which wires shard feeds through pumps into one dispatcher
//!
//! ```ignore
//! use gust_runtime::GustClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GustClient::new()?;
//!
//!     client.dispatcher().subscribe(|event: EventContext<GuildAvailableEvent>| {
//!         tracing::info!(guild = %event.guild.name, "guild available");
//!     })?;
//!
//!     client.attach_shard(ShardId::new(0), feed)?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;

pub use client::{ClientBuilder, GustClient};
pub use config::{ConfigError, ConfigLoader, ConfigResult, GustConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
