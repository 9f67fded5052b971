//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use gust_core::{EventKind, Intents, Requirement, RequirementTable};
use gust_framework::DEFAULT_DIAGNOSTICS_CAPACITY;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ConfigResult;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GustConfig {
    /// Declared intents and requirement overrides.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway capability settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Declared intents: a list of names, a `"A | B"` expression or raw bits.
    #[serde(default = "default_intents")]
    pub intents: Intents,

    /// Requirement replacements keyed by event kind name.
    #[serde(default)]
    pub requirement_overrides: BTreeMap<String, RequirementSetting>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            intents: default_intents(),
            requirement_overrides: BTreeMap::new(),
        }
    }
}

/// Every intent that does not need to be enabled for the application first.
fn default_intents() -> Intents {
    Intents::ALL
        .iter()
        .map(|(_, flag)| flag)
        .filter(|flag| !Intents::PRIVILEGED.contains(*flag))
        .collect()
}

impl GatewayConfig {
    /// Builds the requirement table, rejecting unknown kind names.
    pub fn requirement_table(&self) -> ConfigResult<RequirementTable> {
        let mut table = RequirementTable::new();
        for (name, setting) in &self.requirement_overrides {
            let kind: EventKind = name.parse()?;
            if !table.is_provisional(kind) {
                warn!(%kind, "overriding a documented requirement");
            }
            table = table.with_override(kind, setting.to_requirement());
        }
        Ok(table)
    }
}

/// A requirement as written in configuration.
///
/// ```toml
/// [gateway.requirement_overrides]
/// PrivateChannelPinsUpdate = "ungated"
/// IntegrationsUpdate = { all_of = ["GUILD_EMOJIS"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSetting {
    AllOf(Intents),
    AnyOf(Intents),
    Ungated,
}

impl RequirementSetting {
    pub fn to_requirement(&self) -> Requirement {
        match self {
            Self::AllOf(intents) => Requirement::AllOf(*intents),
            Self::AnyOf(intents) => Requirement::AnyOf(*intents),
            Self::Ungated => Requirement::Ungated,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Diagnostics buffered per receiver before the oldest are dropped.
    #[serde(default = "default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            diagnostics_capacity: default_diagnostics_capacity(),
        }
    }
}

fn default_diagnostics_capacity() -> usize {
    DEFAULT_DIAGNOSTICS_CAPACITY
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// How the log file is rotated.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-target levels, e.g. `gust_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            rotation: LogRotation::default(),
            filters: BTreeMap::new(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `Full` without it.
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
