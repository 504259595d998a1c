//! Host-side configuration.
//!
//! Read once at startup from `<config dir>/octopad/config.toml`. A missing
//! file falls back to defaults so the plugin still runs unconfigured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::controller::StickShaping;

const CONFIG_DIR: &str = "octopad";
const CONFIG_FILE: &str = "config.toml";
const MAPPING_DB_FILE: &str = "gamecontrollerdb.txt";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where a loaded configuration came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at the given path
    Defaults(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "configuration from {}", path.display()),
            ConfigSource::Defaults(path) => {
                write!(f, "default configuration ({} does not exist)", path.display())
            }
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// SDL controller mapping database; relative paths resolve against the
    /// directory holding the config file
    pub mapping_db: PathBuf,
    /// Optional file receiving timestamped log lines
    pub log_file: Option<PathBuf>,
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub log_level: String,
    /// Time between two `get_inputs` calls in the frame driver
    pub frame_interval_ms: u64,
    /// Stick deadzone as a fraction of full scale
    pub deadzone: f32,
    /// Stick deflection treated as full scale
    pub edge: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mapping_db: config_dir().join(MAPPING_DB_FILE),
            log_file: None,
            log_level: "info".to_string(),
            frame_interval_ms: 16,
            deadzone: 0.1,
            edge: 0.9,
        }
    }
}

impl InputConfig {
    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE)
    }

    /// Loads the default config file, also reporting where the values came
    /// from so callers can log it once logging is up.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        Self::load_with_source(Self::default_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    pub fn load_with_source(path: impl AsRef<Path>) -> Result<(Self, ConfigSource), ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if config.mapping_db.is_relative() {
            if let Some(parent) = path.parent() {
                config.mapping_db = parent.join(&config.mapping_db);
            }
        }

        info!("Loaded configuration from {}", path.display());
        debug!("Configuration: {:?}", config);
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("deadzone", self.deadzone), ("edge", self.edge)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }
        if self.edge < self.deadzone {
            return Err(ConfigError::Invalid(format!(
                "edge ({}) must not be below deadzone ({})",
                self.edge, self.deadzone
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level {:?}", self.log_level)))
    }

    pub fn shaping(&self) -> StickShaping {
        StickShaping::new(self.deadzone, self.edge)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        })
        .join(CONFIG_DIR)
}
