//! Configuration file loading and default locations
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Arguments and environment variables are handled by the binary's CLI
//! parser; this module supplies levels 3 and 4.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NIJIRADIO_CONFIG";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub station: Option<String>,
}

impl TomlConfig {
    /// Parse a config file, failing on unreadable or malformed content
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load the first config file found, or defaults
    ///
    /// A missing or broken file never prevents start-up: it is reported and
    /// the compiled defaults are used instead.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = locate_config_file(explicit) else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Find the config file to use
///
/// An explicit path (CLI) wins, then `NIJIRADIO_CONFIG`, then the per-user
/// file, then the system-wide file on Linux.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("nijiradio").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/nijiradio/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent data folder
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("nijiradio"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/nijiradio"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("nijiradio"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/nijiradio"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("nijiradio"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\nijiradio"))
    } else {
        PathBuf::from("./nijiradio_data")
    }
}

/// Default checkpoint database location
pub fn default_database_path() -> PathBuf {
    default_data_folder().join("nijiradio.db")
}
