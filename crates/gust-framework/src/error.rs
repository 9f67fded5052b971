//! Error types for the gust framework.

use gust_core::{Intents, Requirement};
use thiserror::Error;

use crate::dispatcher::DispatcherState;

/// Errors returned by dispatcher operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The declared intents can never cause the target to be delivered.
    #[error(
        "cannot subscribe to {target}: it requires {requirement} but the declared intents are {declared}"
    )]
    UnsatisfiableCapability {
        /// The kind or family being subscribed to.
        target: String,
        /// What the target needs.
        requirement: Requirement,
        /// What the client declared.
        declared: Intents,
        /// Flags that would have to be added.
        missing: Intents,
    },

    /// The operation is not allowed in the dispatcher's current state.
    #[error("cannot {operation} while the dispatcher is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state at the time of the call.
        state: DispatcherState,
    },
}

impl DispatchError {
    /// Creates an invalid state error.
    pub fn invalid_state(operation: &'static str, state: DispatcherState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Returns `true` if the dispatcher has been shut down.
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self,
            Self::InvalidState {
                state: DispatcherState::Shutdown,
                ..
            }
        )
    }
}

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
