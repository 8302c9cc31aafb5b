//! Application context that holds resolved configuration
//!
//! The configuration is resolved in this order:
//! 1. Default values
//! 2. Config file values
//! 3. `SILO_` environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use libsilo::{Config, Silo};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Verbosity requested with `-v` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Use the configured log level
    Normal,
    /// `-v`
    Debug,
    /// `-vv` and above
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Normal,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

/// Application context with resolved configuration
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build the context from an optional config file and CLI flags
    pub fn build(
        config_path: Option<&Path>,
        catalog: Option<PathBuf>,
        verbosity: VerbosityLevel,
    ) -> Result<Self, String> {
        let mut config = Config::load(config_path).map_err(|e| e.to_string())?;
        if let Some(path) = catalog {
            config.catalog.path = Some(path);
        }

        Ok(Self { config, verbosity })
    }

    /// Log filter: `RUST_LOG` wins, then `-v` flags, then the config
    pub fn log_filter(&self) -> String {
        if let Ok(filter) = std::env::var("RUST_LOG") {
            return filter;
        }
        match self.verbosity {
            VerbosityLevel::Normal => self.config.logging.level.clone(),
            VerbosityLevel::Debug => "debug".to_string(),
            VerbosityLevel::Trace => "trace".to_string(),
        }
    }

    /// Install the tracing subscriber; logs go to stderr
    pub fn init_logging(&self) {
        tracing_subscriber::registry()
            .with(EnvFilter::new(self.log_filter()))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Open the catalog named by the configuration
    pub fn open_silo(&self) -> Result<Silo, String> {
        Silo::open(&self.config).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
