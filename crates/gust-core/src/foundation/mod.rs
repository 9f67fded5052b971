//! Foundation layer - identifiers, intents and shard identity.
//!
//! This module contains the value types every other layer builds on:
//! - [`Snowflake`] ids decoded from numeric strings
//! - [`Intents`], the declared capability set
//! - [`ShardId`] and the transport-facing feed types
//! - Timestamp decoding helpers

pub mod intents;
pub mod shard;
pub mod snowflake;
pub mod time;

pub use intents::Intents;
pub use shard::{GatewayShard, RawDispatch, ShardFeed, ShardId};
pub use snowflake::Snowflake;
pub use time::Timestamp;
