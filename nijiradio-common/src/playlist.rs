//! Playlist data model and rotation policy
//!
//! A station's entire durable state is the triple
//! `{tracks, current_track_index, start_time}`. Everything the engine does
//! (elapsed time, remaining time, what plays next) is derived from that
//! triple plus the current wall-clock time.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Playlists shorter than this replay finished tracks from the tail;
/// playlists at or above it consume each track once.
pub const ROTATION_THRESHOLD: usize = 10;

/// A playable unit: an opaque locator plus its scheduling length
///
/// `duration_ms` is authoritative for scheduling, regardless of the real
/// length of the media behind `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    pub url: String,
    #[serde(rename = "durationMs", alias = "duration")]
    pub duration_ms: u64,
}

impl Track {
    pub fn new(url: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            url: url.into(),
            duration_ms,
        }
    }

    /// Reject tracks that cannot be scheduled
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidInput("track url must not be empty".to_string()));
        }
        if self.duration_ms == 0 {
            return Err(Error::InvalidInput(format!(
                "track '{}' must have a positive duration",
                self.url
            )));
        }
        Ok(())
    }
}

/// Validate every track of an inbound command
pub fn validate_tracks(tracks: &[Track]) -> Result<()> {
    tracks.iter().try_for_each(Track::validate)
}

/// Playlist, current position and anchor time of a station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistState {
    pub tracks: Vec<Track>,
    pub current_track_index: usize,
    /// Epoch milliseconds at which the current track started
    pub start_time: i64,
}

impl PlaylistState {
    /// Fresh, idle playlist anchored at `now_ms`
    pub fn empty(now_ms: i64) -> Self {
        Self {
            tracks: Vec::new(),
            current_track_index: 0,
            start_time: now_ms,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current_track_index)
    }

    /// Milliseconds since the anchor time, never negative
    pub fn elapsed_ms(&self, now_ms: i64) -> u64 {
        now_ms.saturating_sub(self.start_time).max(0) as u64
    }

    /// Time left in the current track's window, `None` when idle
    pub fn remaining_ms(&self, now_ms: i64) -> Option<u64> {
        self.current_track()
            .map(|track| track.duration_ms.saturating_sub(self.elapsed_ms(now_ms)))
    }

    /// Force the index back into range (0 when out of bounds)
    pub fn normalize(&mut self) {
        if self.current_track_index >= self.tracks.len() {
            self.current_track_index = 0;
        }
    }

    /// Append tracks to the tail
    ///
    /// Returns `true` on a cold start: the playlist was empty, so the first
    /// appended track becomes current and the anchor moves to `now_ms`.
    pub fn append(&mut self, tracks: Vec<Track>, now_ms: i64) -> bool {
        let was_idle = self.is_idle();
        self.tracks.extend(tracks);

        if was_idle && !self.is_idle() {
            self.current_track_index = 0;
            self.start_time = now_ms;
            return true;
        }
        false
    }

    /// Swap the whole playlist and restart from its head
    pub fn replace(&mut self, tracks: Vec<Track>, now_ms: i64) {
        self.tracks = tracks;
        self.current_track_index = 0;
        self.start_time = now_ms;
    }

    /// Empty the playlist; the anchor is left alone
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_track_index = 0;
    }

    /// Finish the current positional slot and move to the next track
    ///
    /// The finished track is identified by index, so duplicate urls are
    /// never confused. Below [`ROTATION_THRESHOLD`] it moves to the tail,
    /// otherwise it is dropped. Returns `true` when a track is current
    /// afterwards; an empty playlist is left untouched.
    pub fn advance(&mut self, now_ms: i64) -> bool {
        if self.tracks.is_empty() {
            return false;
        }

        self.normalize();
        let rotate = self.tracks.len() < ROTATION_THRESHOLD;
        let finished = self.tracks.remove(self.current_track_index);
        if rotate {
            self.tracks.push(finished);
        }

        if self.tracks.is_empty() {
            self.current_track_index = 0;
            return false;
        }

        self.normalize();
        self.start_time = now_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(names: &[&str]) -> Vec<Track> {
        names.iter().map(|n| Track::new(*n, 1000)).collect()
    }

    fn urls(state: &PlaylistState) -> Vec<&str> {
        state.tracks.iter().map(|t| t.url.as_str()).collect()
    }

    #[test]
    fn test_track_json_accepts_duration_alias() {
        let t: Track = serde_json::from_str(r#"{"url":"a.mp3","duration":1500}"#).unwrap();
        assert_eq!(t, Track::new("a.mp3", 1500));

        let t: Track = serde_json::from_str(r#"{"url":"a.mp3","durationMs":1500}"#).unwrap();
        assert_eq!(t.duration_ms, 1500);
    }

    #[test]
    fn test_track_json_rejects_bad_shapes() {
        assert!(serde_json::from_str::<Track>(r#"{"url":"a","duration":"10"}"#).is_err());
        assert!(serde_json::from_str::<Track>(r#"{"url":"a","duration":1.5}"#).is_err());
        assert!(serde_json::from_str::<Track>(r#"{"url":"a","duration":-3}"#).is_err());
        assert!(serde_json::from_str::<Track>(r#"{"url":5,"duration":10}"#).is_err());
        assert!(serde_json::from_str::<Track>(r#"{"url":"a"}"#).is_err());
        assert!(serde_json::from_str::<Track>(r#"{"url":"a","duration":1,"x":1}"#).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_duration_and_blank_url() {
        assert!(Track::new("a", 0).validate().is_err());
        assert!(Track::new("  ", 10).validate().is_err());
        assert!(validate_tracks(&[Track::new("a", 1), Track::new("b", 0)]).is_err());
        assert!(validate_tracks(&tracks(&["a", "b"])).is_ok());
    }

    #[test]
    fn test_append_cold_start_resets_anchor() {
        let mut state = PlaylistState::empty(100);
        assert!(state.append(tracks(&["a", "b"]), 500));
        assert_eq!(state.current_track_index, 0);
        assert_eq!(state.start_time, 500);
        assert_eq!(state.current_track().unwrap().url, "a");
    }

    #[test]
    fn test_append_to_playing_is_silent() {
        let mut state = PlaylistState::empty(0);
        state.append(tracks(&["a"]), 10);
        assert!(!state.append(tracks(&["b"]), 900));
        assert_eq!(state.start_time, 10);
        assert_eq!(urls(&state), vec!["a", "b"]);
    }

    #[test]
    fn test_append_nothing_to_idle_is_not_cold_start() {
        let mut state = PlaylistState::empty(0);
        assert!(!state.append(Vec::new(), 10));
        assert!(state.is_idle());
    }

    #[test]
    fn test_advance_rotates_short_playlist() {
        let mut state = PlaylistState::empty(0);
        state.append(tracks(&["a", "b"]), 0);

        assert!(state.advance(1000));
        assert_eq!(urls(&state), vec!["b", "a"]);
        assert_eq!(state.current_track_index, 0);
        assert_eq!(state.start_time, 1000);
    }

    #[test]
    fn test_advance_preserves_multiset_below_threshold() {
        let mut state = PlaylistState::empty(0);
        let names: Vec<String> = (0..ROTATION_THRESHOLD - 1).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        state.append(tracks(&refs), 0);

        for step in 0..25 {
            assert!(state.advance(step));
            let mut sorted: Vec<&str> = urls(&state);
            sorted.sort();
            let mut expected = refs.clone();
            expected.sort();
            assert_eq!(sorted, expected);
            assert!(state.current_track_index < state.tracks.len());
        }
    }

    #[test]
    fn test_advance_consumes_at_threshold() {
        let mut state = PlaylistState::empty(0);
        let names: Vec<String> = (0..ROTATION_THRESHOLD).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        state.append(tracks(&refs), 0);

        assert!(state.advance(5));
        assert_eq!(state.tracks.len(), ROTATION_THRESHOLD - 1);
        assert!(!state.tracks.iter().any(|t| t.url == "t0"));
        assert_eq!(state.current_track().unwrap().url, "t1");

        // Now below the threshold: rotation kicks in
        assert!(state.advance(6));
        assert_eq!(state.tracks.len(), ROTATION_THRESHOLD - 1);
        assert_eq!(state.tracks.last().unwrap().url, "t1");
    }

    #[test]
    fn test_advance_with_duplicate_urls_uses_slot() {
        let mut state = PlaylistState::empty(0);
        state.append(vec![Track::new("x", 10), Track::new("x", 20), Track::new("y", 30)], 0);

        assert!(state.advance(1));
        assert_eq!(state.tracks, vec![Track::new("x", 20), Track::new("y", 30), Track::new("x", 10)]);
    }

    #[test]
    fn test_advance_wraps_overflowing_index() {
        let names: Vec<String> = (0..ROTATION_THRESHOLD).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = PlaylistState {
            tracks: tracks(&refs),
            current_track_index: ROTATION_THRESHOLD - 1,
            start_time: 0,
        };
        assert!(state.advance(50));
        assert_eq!(state.current_track_index, 0);
        assert_eq!(state.current_track().unwrap().url, "t0");
        assert_eq!(state.tracks.len(), ROTATION_THRESHOLD - 1);
    }

    #[test]
    fn test_advance_single_track_at_threshold_edge_empties() {
        let mut state = PlaylistState {
            tracks: tracks(&["a"]),
            current_track_index: 0,
            start_time: 7,
        };
        // One track is below the threshold, so it replays
        assert!(state.advance(50));
        assert_eq!(urls(&state), vec!["a"]);

        let mut empty = PlaylistState::empty(3);
        assert!(!empty.advance(50));
        assert_eq!(empty.start_time, 3);
    }

    #[test]
    fn test_remaining_and_elapsed() {
        let mut state = PlaylistState::empty(0);
        assert_eq!(state.remaining_ms(10), None);

        state.append(vec![Track::new("a", 5000)], 1000);
        assert_eq!(state.elapsed_ms(3000), 2000);
        assert_eq!(state.remaining_ms(3000), Some(3000));
        assert_eq!(state.remaining_ms(7000), Some(0));
        // Clock behind the anchor
        assert_eq!(state.elapsed_ms(500), 0);
        assert_eq!(state.remaining_ms(500), Some(5000));
    }

    #[test]
    fn test_clear_keeps_anchor() {
        let mut state = PlaylistState::empty(0);
        state.append(tracks(&["a", "b"]), 42);
        state.clear();
        assert!(state.is_idle());
        assert_eq!(state.current_track_index, 0);
        assert_eq!(state.start_time, 42);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = PlaylistState {
            tracks: tracks(&["a"]),
            current_track_index: 0,
            start_time: 9,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentTrackIndex"], 0);
        assert_eq!(json["startTime"], 9);
        assert_eq!(json["tracks"][0]["durationMs"], 1000);
    }
}
