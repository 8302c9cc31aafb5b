//! Application configuration.
//!
//! Defaults are layered under an optional YAML file and `SILO_` prefixed
//! environment variables, e.g. `SILO_NETWORK__TIMEOUT=60`.

use crate::client::ClientConfig;
use crate::error::{Result, SiloError};
use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(defaults()?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read when present. Environment overrides apply in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    pub(crate) fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(defaults()?);

        match path {
            Some(p) => builder = builder.add_source(File::from(p).required(true)),
            None => {
                if let Some(p) = Self::default_path().filter(|p| p.exists()) {
                    builder = builder.add_source(File::from(p).required(false));
                }
            }
        }

        Self::from_builder(builder.add_source(env))
    }

    /// Default config file location, `~/.config/silo/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("silo").join("config.yaml"))
    }

    /// Client settings for registry connections.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.network.timeout)
            .with_max_idle_per_host(self.network.max_idle_per_host)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                SiloError::config_with_source(
                    "Failed to deserialize configuration",
                    None::<&str>,
                    e,
                )
            })
    }
}

fn defaults() -> Result<ConfigRs> {
    ConfigRs::try_from(&Config::default()).map_err(|e| {
        SiloError::config_with_source("Failed to build default configuration", None::<&str>, e)
    })
}

fn environment() -> Environment {
    Environment::with_prefix("SILO")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Request timeout in seconds.
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

/// Catalog storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Catalog {
    /// Catalog file; defaults to `~/.local/share/silo/catalog.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Catalog {
    /// Returns the configured catalog file or the default one.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("silo")
                .join("catalog.json"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logging {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
