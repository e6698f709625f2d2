//! Station sync engine
//!
//! Owns one station's playlist, the anchor time of the current track and
//! the single outstanding deadline that advances playback when the track's
//! window elapses.
//!
//! **Ordering:** every mutation runs under one async mutex and follows
//! persist → broadcast → re-arm. The new state is built on a copy and only
//! committed after the checkpoint write succeeds, so a failed write leaves
//! memory, listeners and the deadline exactly as they were.
//!
//! **Restart:** nothing in memory is load-bearing. [`SyncEngine::initialize`]
//! rebuilds everything from the checkpoint and the current clock; a window
//! that elapsed while the station was down advances on the next tick.

use nijiradio_common::playlist::validate_tracks;
use nijiradio_common::time::millis_to_duration;
use nijiradio_common::{Clock, PlaylistState, StationEvent, Track};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use super::deadline::Deadline;
use crate::db::checkpoint::{load_checkpoint, save_checkpoint, StateStore};
use crate::error::{Error, Result};
use crate::push::{BroadcastHub, ConnectionId, PushSink};

/// Delay before a timed advance that failed to persist is tried again
pub const ADVANCE_RETRY: Duration = Duration::from_secs(5);

struct EngineState {
    playlist: PlaylistState,
    deadline: Option<Deadline>,
    generation: u64,
}

/// The authoritative coordinator for one station
pub struct SyncEngine {
    name: String,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    hub: BroadcastHub,
    state: Mutex<EngineState>,
    initialized: OnceCell<()>,
    me: Weak<SyncEngine>,
}

impl SyncEngine {
    /// Create an engine; it loads nothing until first used
    pub fn new(name: impl Into<String>, store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Arc<Self> {
        let now = clock.now_ms();
        Arc::new_cyclic(|me| Self {
            name: name.into(),
            store,
            clock,
            hub: BroadcastHub::new(),
            state: Mutex::new(EngineState {
                playlist: PlaylistState::empty(now),
                deadline: None,
                generation: 0,
            }),
            initialized: OnceCell::new(),
            me: me.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Load the checkpoint and arm the deadline if a track is current
    ///
    /// Idempotent; every other entry point awaits it first. A failed load
    /// is reported and retried by the next caller.
    pub async fn initialize(&self) -> Result<()> {
        self.initialized
            .get_or_try_init(|| async {
                let now = self.clock.now_ms();
                let playlist = load_checkpoint(self.store.as_ref(), now).await?;

                let mut state = self.state.lock().await;
                info!(
                    "Station '{}' activated: {} tracks, current index {}, elapsed {} ms",
                    self.name,
                    playlist.tracks.len(),
                    playlist.current_track_index,
                    playlist.elapsed_ms(now)
                );
                state.playlist = playlist;
                self.arm(&mut state);
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    /// Append tracks to the tail of the playlist
    ///
    /// Into an idle station this is a cold start: the first new track
    /// becomes current and is announced. Otherwise the append is persisted
    /// silently and the deadline is untouched.
    pub async fn add(&self, tracks: Vec<Track>) -> Result<()> {
        validate_tracks(&tracks)?;
        self.initialize().await?;
        if tracks.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        let mut next = state.playlist.clone();
        let added = tracks.len();
        let cold_start = next.append(tracks, self.clock.now_ms());
        self.commit(&mut state, next).await?;

        if cold_start {
            info!("Station '{}' starting with {} new tracks", self.name, added);
            self.hub.broadcast(&StationEvent::change_track(&state.playlist));
            self.arm(&mut state);
        } else {
            debug!("Station '{}' queued {} tracks", self.name, added);
        }
        Ok(())
    }

    /// Swap the whole playlist and restart from its head
    pub async fn replace(&self, tracks: Vec<Track>) -> Result<()> {
        validate_tracks(&tracks)?;
        self.initialize().await?;

        let mut state = self.state.lock().await;
        let mut next = state.playlist.clone();
        next.replace(tracks, self.clock.now_ms());
        self.commit(&mut state, next).await?;

        info!("Station '{}' playlist replaced ({} tracks)", self.name, state.playlist.tracks.len());
        self.hub.broadcast(&StationEvent::change_track(&state.playlist));
        self.arm(&mut state);
        Ok(())
    }

    /// Empty the playlist and cancel the pending deadline
    pub async fn clear(&self) -> Result<()> {
        self.initialize().await?;

        let mut state = self.state.lock().await;
        let mut next = state.playlist.clone();
        next.clear();
        self.commit(&mut state, next).await?;

        info!("Station '{}' playlist cleared", self.name);
        self.hub.broadcast(&StationEvent::change_track(&state.playlist));
        self.arm(&mut state);
        Ok(())
    }

    /// Finish the current track now and move on
    ///
    /// Normally driven by the deadline. On an idle station this is a no-op.
    pub async fn advance(&self) -> Result<()> {
        self.initialize().await?;
        let mut state = self.state.lock().await;
        self.advance_locked(&mut state).await
    }

    /// Current position as a `sync` event (all-null when idle)
    pub async fn sync_snapshot(&self) -> Result<StationEvent> {
        self.initialize().await?;
        let state = self.state.lock().await;
        Ok(StationEvent::sync(&state.playlist, self.clock.now_ms()))
    }

    /// Copy of the current playlist state
    pub async fn playlist(&self) -> Result<PlaylistState> {
        self.initialize().await?;
        Ok(self.state.lock().await.playlist.clone())
    }

    /// Register a push connection, greeting it with a `sync` snapshot
    ///
    /// Returns `None` when the connection could not take the greeting.
    pub async fn connect(&self, sink: Arc<dyn PushSink>) -> Result<Option<ConnectionId>> {
        self.initialize().await?;
        // Hold the state lock so no broadcast slips in between snapshot and registration
        let state = self.state.lock().await;
        let greeting = StationEvent::sync(&state.playlist, self.clock.now_ms());
        Ok(self.hub.register(sink, &greeting))
    }

    /// Answer a connection's `requestSync` on that connection only
    pub async fn request_sync(&self, sink: &dyn PushSink) -> Result<bool> {
        let snapshot = self.sync_snapshot().await?;
        Ok(BroadcastHub::send_to(sink, &snapshot))
    }

    pub fn disconnect(&self, id: ConnectionId) {
        self.hub.deregister(id);
    }

    pub async fn has_pending_deadline(&self) -> bool {
        self.state.lock().await.deadline.is_some()
    }

    /// Persist `next`, then make it the live state
    async fn commit(&self, state: &mut EngineState, next: PlaylistState) -> Result<()> {
        if let Err(e) = save_checkpoint(self.store.as_ref(), &next).await {
            warn!("Station '{}' checkpoint write failed: {}", self.name, e);
            return Err(match e {
                Error::Persistence(msg) => Error::Persistence(msg),
                other => Error::Persistence(other.to_string()),
            });
        }
        state.playlist = next;
        Ok(())
    }

    async fn advance_locked(&self, state: &mut EngineState) -> Result<()> {
        if state.playlist.is_idle() {
            debug!("Station '{}' advance ignored: playlist empty", self.name);
            return Ok(());
        }

        let mut next = state.playlist.clone();
        let playing = next.advance(self.clock.now_ms());
        self.commit(state, next).await?;

        match state.playlist.current_track() {
            Some(track) if playing => {
                info!("Station '{}' now playing {} ({} ms)", self.name, track.url, track.duration_ms)
            }
            _ => info!("Station '{}' playlist exhausted, going idle", self.name),
        }
        self.hub.broadcast(&StationEvent::change_track(&state.playlist));
        self.arm(state);
        Ok(())
    }

    /// Replace the outstanding deadline with one for the current track
    ///
    /// The remaining time is always recomputed from the anchor; an idle
    /// playlist just cancels.
    fn arm(&self, state: &mut EngineState) {
        if let Some(previous) = state.deadline.take() {
            previous.cancel();
        }

        let Some(remaining) = state.playlist.remaining_ms(self.clock.now_ms()) else {
            return;
        };
        self.schedule(state, millis_to_duration(remaining));
    }

    /// Spawn the next deadline generation; the caller has cleared the old one
    fn schedule(&self, state: &mut EngineState, delay: Duration) {
        state.generation += 1;
        let generation = state.generation;
        let engine = self.me.clone();
        state.deadline = Some(Deadline::spawn(generation, delay, async move {
            if let Some(engine) = engine.upgrade() {
                engine.on_deadline(generation).await;
            }
        }));
        debug!(
            "Station '{}' deadline #{} armed for {} ms",
            self.name,
            generation,
            delay.as_millis()
        );
    }

    async fn on_deadline(&self, generation: u64) {
        let mut state = self.state.lock().await;

        let current = state.deadline.as_ref().map(Deadline::generation);
        if current != Some(generation) {
            debug!("Station '{}' stale deadline #{} ignored", self.name, generation);
            return;
        }
        if let Some(own) = state.deadline.take() {
            own.release();
        }

        if let Err(e) = self.advance_locked(&mut state).await {
            error!(
                "Station '{}' could not advance, retrying in {} ms: {}",
                self.name,
                ADVANCE_RETRY.as_millis(),
                e
            );
            self.schedule(&mut state, ADVANCE_RETRY);
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(deadline) = self.state.get_mut().deadline.take() {
            deadline.cancel();
        }
    }
}
