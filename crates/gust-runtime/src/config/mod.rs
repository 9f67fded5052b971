//! Configuration for the gust runtime.
//!
//! Layered loading through figment, a typed schema and validation of the
//! values serde cannot check on its own.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config};
pub use schema::{
    DispatchConfig, GatewayConfig, GustConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, RequirementSetting, SpanEventConfig,
};
pub use validation::validate_config;
