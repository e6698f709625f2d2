//! Station directory
//!
//! Routes a stable station name to exactly one [`SyncEngine`]. The first
//! lookup of a name activates its engine over that station's slice of the
//! checkpoint table; every later lookup returns the same instance.

use nijiradio_common::Clock;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::engine::SyncEngine;
use crate::db::checkpoint::SqliteStore;
use crate::error::{Error, Result};

const MAX_STATION_NAME_LEN: usize = 64;

/// Registry of active stations keyed by name
pub struct StationDirectory {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    stations: Mutex<HashMap<String, Arc<SyncEngine>>>,
}

impl StationDirectory {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            stations: Mutex::new(HashMap::new()),
        }
    }

    /// The engine for `name`, created on first use
    ///
    /// Only ASCII letters, digits, `-` and `_` are accepted.
    pub fn get(&self, name: &str) -> Result<Arc<SyncEngine>> {
        validate_station_name(name)?;

        let mut stations = self.stations.lock().unwrap_or_else(|e| e.into_inner());
        let engine = stations.entry(name.to_string()).or_insert_with(|| {
            info!("Activating station '{}'", name);
            let store = Arc::new(SqliteStore::new(self.pool.clone(), name));
            SyncEngine::new(name, store, Arc::clone(&self.clock))
        });
        Ok(Arc::clone(engine))
    }

    /// The engine for `name` if it is already active
    ///
    /// Never creates one; unknown and invalid names are `NotFound`.
    pub fn find(&self, name: &str) -> Result<Arc<SyncEngine>> {
        validate_station_name(name)?;

        let stations = self.stations.lock().unwrap_or_else(|e| e.into_inner());
        stations
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No such station: {}", name)))
    }

    /// Look up `name` and load its checkpoint so its deadline is running
    pub async fn activate(&self, name: &str) -> Result<Arc<SyncEngine>> {
        let engine = self.get(name)?;
        engine.initialize().await?;
        Ok(engine)
    }

    /// Names of stations activated so far
    pub fn names(&self) -> Vec<String> {
        let stations = self.stations.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = stations.keys().cloned().collect();
        names.sort();
        names
    }
}

fn validate_station_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_STATION_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::NotFound(format!("No such station: {}", name)))
    }
}
