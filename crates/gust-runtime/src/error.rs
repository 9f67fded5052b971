//! Runtime error types.

use gust_core::ShardId;
use gust_framework::DispatchError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A feed for this shard is already attached.
    #[error("{0} is already attached")]
    ShardAttached(ShardId),

    /// Installing a shutdown signal handler failed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
