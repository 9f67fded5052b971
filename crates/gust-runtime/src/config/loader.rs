//! Layered configuration loading.
//!
//! Later sources override earlier ones:
//!
//! 1. [`GustConfig::default`]
//! 2. Structs passed to [`ConfigLoader::merge`]
//! 3. `gust.{profile}.toml` (or `.yaml`) next to the base file
//! 4. `gust.toml` / `config.toml` (or `gust.yaml` / `gust.yml`)
//! 5. `GUST_*` environment variables, `__` separating nested keys
//!
//! The search covers the current directory, then the user config directory
//! (`~/.config/gust` on Linux). `GUST_PROFILE` picks the profile.
//!
//! ```text
//! GUST_GATEWAY__INTENTS="GUILDS | GUILD_BANS"
//! GUST_DISPATCH__DIAGNOSTICS_CAPACITY=512
//! GUST_LOGGING__LEVEL=debug
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::GustConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "GUST_";

/// File names tried in each search directory, in order.
const CANDIDATES: &[(&str, FileFormat)] = &[
    #[cfg(feature = "toml-config")]
    ("gust.toml", FileFormat::Toml),
    #[cfg(feature = "toml-config")]
    ("config.toml", FileFormat::Toml),
    #[cfg(feature = "yaml-config")]
    ("gust.yaml", FileFormat::Yaml),
    #[cfg(feature = "yaml-config")]
    ("gust.yml", FileFormat::Yaml),
];

/// Deployment profile, selecting `gust.{profile}.*` overlays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    #[cfg(feature = "toml-config")]
    Toml,
    #[cfg(feature = "yaml-config")]
    Yaml,
}

impl FileFormat {
    fn of(path: &Path) -> ConfigResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        CANDIDATES
            .iter()
            .find(|(name, _)| name.rsplit_once('.').is_some_and(|(_, e)| e == ext))
            .map(|(_, format)| *format)
            .ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }

    #[allow(unused_variables)]
    fn merge_into(self, figment: Figment, path: &Path) -> Figment {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => figment.merge(Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => figment.merge(Yaml::file(path)),
        }
    }
}

/// Builds a [`GustConfig`] from defaults, files and the environment.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let profile = std::env::var("GUST_PROFILE")
            .map(|name| Profile::parse(&name))
            .unwrap_or_default();
        Self {
            figment: Figment::new(),
            profile,
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Searches `path` instead of the default directories.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Layers `config` above the defaults and below files.
    pub fn merge(mut self, config: GustConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<GustConfig> {
        let profile = self.profile.clone();
        let config: GustConfig = self.into_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            %profile,
            intents = %config.gateway.intents,
            overrides = config.gateway.requirement_overrides.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn into_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(GustConfig::default()))
            .merge(std::mem::take(&mut self.figment));

        figment = match &self.config_file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => {
                let format = FileFormat::of(path)?;
                info!(path = %path.display(), "loading configuration file");
                format.merge_into(figment, path)
            }
            None => self.search(figment),
        };

        if self.load_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }
        Ok(figment)
    }

    /// Merges the first base file found, preceded by its profile overlay.
    fn search(&self, figment: Figment) -> Figment {
        let directories = if self.search_paths.is_empty() {
            std::env::current_dir()
                .into_iter()
                .chain(dirs::config_dir().map(|dir| dir.join("gust")))
                .collect()
        } else {
            self.search_paths.clone()
        };

        for directory in &directories {
            for (name, format) in CANDIDATES {
                let base = directory.join(name);
                if !base.exists() {
                    continue;
                }

                let mut figment = figment;
                if let Some((stem, ext)) = name.rsplit_once('.') {
                    let overlay = directory.join(format!("{stem}.{}.{ext}", self.profile));
                    if overlay.exists() {
                        debug!(path = %overlay.display(), "loading profile overlay");
                        figment = format.merge_into(figment, &overlay);
                    }
                }
                info!(path = %base.display(), "loading configuration file");
                return format.merge_into(figment, &base);
            }
        }

        warn!("no configuration file found, using defaults");
        figment
    }
}

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<GustConfig> {
    ConfigLoader::new().load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(all(test, feature = "toml-config"))]
mod tests {
    use figment::Jail;
    use gust_core::{EventKind, Intents, Requirement};

    use super::*;
    use crate::config::{LogFormat, LogLevel};

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config, GustConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gust.toml",
                r#"
                [gateway]
                intents = ["GUILDS", "GUILD_INVITES"]

                [gateway.requirement_overrides]
                PrivateChannelPinsUpdate = "ungated"

                [logging]
                level = "debug"
                format = "pretty"
                "#,
            )?;
            jail.set_env("GUST_LOGGING__LEVEL", "warn");
            jail.set_env("GUST_DISPATCH__DIAGNOSTICS_CAPACITY", "32");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.gateway.intents, Intents::GUILDS | Intents::GUILD_INVITES);
            assert_eq!(config.logging.level, LogLevel::Warn);
            assert_eq!(config.logging.format, LogFormat::Pretty);
            assert_eq!(config.dispatch.diagnostics_capacity, 32);

            let table = config.gateway.requirement_table().map_err(|e| e.to_string())?;
            assert_eq!(
                table.required_capabilities(EventKind::PrivateChannelPinsUpdate),
                Requirement::Ungated
            );
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_merged_under_base() {
        Jail::expect_with(|jail| {
            jail.create_file("gust.production.toml", "[dispatch]\ndiagnostics_capacity = 8\n")?;
            jail.create_file("gust.toml", "[logging]\nlevel = \"error\"\n")?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.dispatch.diagnostics_capacity, 8);
            assert_eq!(config.logging.level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("gust.toml", "[gateway]\nintents = [\"GUILD_CATS\"]\n")?;
            let result = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::Extract(_))));

            jail.create_file("gust.toml", "[dispatch]\ndiagnostics_capacity = 0\n")?;
            let result = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::Validation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_format() {
        Jail::expect_with(|jail| {
            jail.create_file("deploy.toml", "[dispatch]\ndiagnostics_capacity = 4\n")?;
            let config = ConfigLoader::new()
                .file("deploy.toml")
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.dispatch.diagnostics_capacity, 4);

            jail.create_file("deploy.json", "{}")?;
            let result = ConfigLoader::new().file("deploy.json").without_env().load();
            assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "json"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/gust.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".to_string()));
    }
}
