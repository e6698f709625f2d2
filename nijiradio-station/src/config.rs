//! nijiradio-station configuration
//!
//! Merges command-line/environment values with the TOML config file and
//! compiled defaults (see [`nijiradio_common::config`]).

use nijiradio_common::config::{default_database_path, TomlConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_STATION: &str = "music-sync";

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub station: Option<String>,
    /// Keep checkpoints in memory only
    pub in_memory: bool,
}

/// Where checkpoints live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

/// Station server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind: IpAddr,
    pub database: DatabaseLocation,
    /// Name of the station served on the unprefixed routes
    pub station: String,
}

impl Config {
    /// Resolve each setting: override, then TOML, then default
    pub fn resolve(overrides: Overrides, toml: TomlConfig) -> Result<Self> {
        let port = overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT);

        let bind_str = overrides
            .bind
            .or(toml.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str
            .parse::<IpAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind_str, e)))?;

        let database = if overrides.in_memory {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(
                overrides
                    .database
                    .or(toml.database)
                    .unwrap_or_else(default_database_path),
            )
        };

        let station = overrides
            .station
            .or(toml.station)
            .unwrap_or_else(|| DEFAULT_STATION.to_string());
        if station.trim().is_empty() {
            return Err(Error::Config("Station name must not be empty".to_string()));
        }

        Ok(Self {
            port,
            bind,
            database,
            station,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
