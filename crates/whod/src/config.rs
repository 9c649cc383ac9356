// Daemon configuration
//
// Two sources:
// - Environment variables for the process itself (port, log level, verbosity,
//   config file path)
// - A JSON file for the propagation entries, parsed by `who_core`
//
// ## Environment
//
// - `WHOAMI_PORT_NUMBER`: Listen port (default 80)
// - `WHO_CONFIG`: Path to the JSON config file (optional)
// - `WHO_VERBOSE`: `true` or `1` enables per-request access logging
// - `WHO_LOG_LEVEL`: trace, debug, info, warn, error (default info)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use who_core::WhoConfig;

/// Listen port when `WHOAMI_PORT_NUMBER` is unset
pub const DEFAULT_PORT: u16 = 80;

/// Process-level settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub port: u16,
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
    pub log_level: String,
}

impl DaemonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("WHOAMI_PORT_NUMBER") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .with_context(|| format!("WHOAMI_PORT_NUMBER '{}' is not a valid port", value))?,
            None => DEFAULT_PORT,
        };

        let verbose = var("WHO_VERBOSE")
            .map(|value| matches!(value.trim().to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        let config = Self {
            port,
            config_path: var("WHO_CONFIG").map(PathBuf::from),
            verbose,
            log_level: var("WHO_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => anyhow::bail!(
                "WHO_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Tracing level matching `log_level`
    pub fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Read the propagation configuration file
///
/// No path, or a path that does not exist, yields an empty configuration.
/// An unreadable file or malformed JSON is an error.
pub fn load_who_config(path: Option<&Path>) -> Result<WhoConfig> {
    let Some(path) = path else {
        return Ok(WhoConfig::default());
    };

    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Config file {} not found, starting empty", path.display());
            return Ok(WhoConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read config file {}", path.display()));
        }
    };

    WhoConfig::from_json(&data).with_context(|| format!("Failed to parse config file {}", path.display()))
}
