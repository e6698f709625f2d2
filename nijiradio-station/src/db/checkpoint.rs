//! Station checkpoint persistence
//!
//! The whole durable state of a station is three keys:
//! `playlist` (JSON track array), `currentTrackIndex` and `startTime`
//! (epoch ms). Remaining time is never stored; it is recomputed from
//! `startTime` on every activation.

use async_trait::async_trait;
use nijiradio_common::{PlaylistState, Track};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::error::{Error, Result};

pub const KEY_PLAYLIST: &str = "playlist";
pub const KEY_CURRENT_TRACK_INDEX: &str = "currentTrackIndex";
pub const KEY_START_TIME: &str = "startTime";

/// Durable key/value store backing one station
///
/// A successful `put`/`put_many` is durable; a failed `put_many` leaves
/// none of its entries visible to a later `get`.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put_many(&self, entries: Vec<(&'static str, String)>) -> Result<()>;

    async fn put(&self, key: &'static str, value: String) -> Result<()> {
        self.put_many(vec![(key, value)]).await
    }
}

/// SQLite-backed store namespaced by station name
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    station: String,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, station: impl Into<String>) -> Self {
        Self {
            pool,
            station: station.into(),
        }
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM station_state WHERE station = ? AND key = ?")
                .bind(&self.station)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn put_many(&self, entries: Vec<(&'static str, String)>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO station_state (station, key, value)
                VALUES (?, ?, ?)
                ON CONFLICT(station, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
                "#,
            )
            .bind(&self.station)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn get_json<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Persistence(format!("Corrupt checkpoint key '{}': {}", key, e))),
        None => Ok(None),
    }
}

/// Load a station's checkpoint, defaulting to an idle playlist anchored at `now_ms`
///
/// A stored index outside the stored playlist is reset to 0.
pub async fn load_checkpoint(store: &dyn StateStore, now_ms: i64) -> Result<PlaylistState> {
    let tracks: Vec<Track> = get_json(store, KEY_PLAYLIST).await?.unwrap_or_default();
    let current_track_index: usize = get_json(store, KEY_CURRENT_TRACK_INDEX)
        .await?
        .unwrap_or(0);
    let start_time: i64 = get_json(store, KEY_START_TIME).await?.unwrap_or(now_ms);

    let mut state = PlaylistState {
        tracks,
        current_track_index,
        start_time,
    };
    state.normalize();
    Ok(state)
}

/// Write the full checkpoint triple atomically
pub async fn save_checkpoint(store: &dyn StateStore, state: &PlaylistState) -> Result<()> {
    store
        .put_many(vec![
            (KEY_PLAYLIST, serde_json::to_string(&state.tracks)?),
            (KEY_CURRENT_TRACK_INDEX, state.current_track_index.to_string()),
            (KEY_START_TIME, state.start_time.to_string()),
        ])
        .await
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store with failure injection for engine tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
        failing: AtomicBool,
        writes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StateStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn put_many(&self, entries: Vec<(&'static str, String)>) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::Persistence("injected write failure".to_string()));
            }
            let mut values = self.values.lock().unwrap();
            for (key, value) in entries {
                values.insert(key.to_string(), value);
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
