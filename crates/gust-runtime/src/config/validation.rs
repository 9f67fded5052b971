//! Configuration validation utilities.

use tracing::warn;

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, GatewayConfig, GustConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &GustConfig) -> ConfigResult<()> {
    validate_gateway_config(&config.gateway)?;
    validate_dispatch_config(&config.dispatch)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_gateway_config(gateway: &GatewayConfig) -> ConfigResult<()> {
    if gateway.intents.is_empty() {
        warn!("no intents declared, only shard lifecycle events will be delivered");
    }
    gateway.requirement_table()?;
    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.diagnostics_capacity == 0 {
        return Err(ConfigError::validation(
            "dispatch.diagnostics_capacity must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    if let Some(target) = logging.filters.keys().find(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "logging.filters contains an empty target: {target:?}"
        )));
    }

    Ok(())
}
