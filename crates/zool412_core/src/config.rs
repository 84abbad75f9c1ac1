//! Layered application configuration.
//!
//! # Responsibility
//! - Merge defaults, config files and `ZOOL412_*` environment variables.
//! - Resolve the effective database path and log directory.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `<config_dir>/zool412/config.toml`
//! 3. `./zool412.toml`
//! 4. `ZOOL412_*` env vars, `__` separating sections (`ZOOL412_DATABASE__PATH`)

use crate::logging::default_log_level;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Database file used when nothing else is configured.
pub const DEFAULT_DB_FILE: &str = "zool412_autostations.db";
const APP_DIR: &str = "zool412";
const PROJECT_CONFIG_FILE: &str = "zool412.toml";
const ENV_PREFIX: &str = "ZOOL412_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute log directory; `None` picks the platform data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// Configured directory, else `<data_local_dir>/zool412/logs`, else a temp dir.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("logs")
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A provider could not be read or a value failed to deserialize.
    Figment(Box<figment::Error>),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "configuration error: {err}"),
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid configuration value for `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err.as_ref()),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

impl AppConfig {
    /// Loads and validates the merged configuration.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extracts from an arbitrary provider chain.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Provider chain used by [`AppConfig::load`].
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                figment = figment.merge(Toml::file(user_path));
            }
        }

        let project_path = Path::new(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            figment = figment.merge(Toml::file(project_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field: "logging.dir",
                    reason: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DEFAULT_DB_FILE};
    use figment::providers::Serialized;
    use figment::{Figment, Jail};
    use std::path::PathBuf;

    #[test]
    fn defaults_point_at_local_database() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, PathBuf::from(DEFAULT_DB_FILE));
        assert!(config.logging.dir.is_none());
        assert!(config.logging.resolved_dir().ends_with("zool412/logs"));
    }

    #[test]
    fn project_file_and_env_layer_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "zool412.toml",
                r#"
[database]
path = "from_file.db"

[logging]
level = "warn"
"#,
            )?;
            jail.set_env("ZOOL412_DATABASE__PATH", "from_env.db");

            let config = AppConfig::load().map_err(|err| err.to_string())?;
            assert_eq!(config.database.path, PathBuf::from("from_env.db"));
            assert_eq!(config.logging.level, "warn");
            Ok(())
        });
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let mut config = AppConfig::default();
        config.logging.dir = Some(PathBuf::from("logs"));

        let err = AppConfig::from_figment(Figment::from(Serialized::defaults(config)))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "logging.dir",
                ..
            }
        ));
    }
}
