//! Push message types exchanged over station connections

use serde::{Deserialize, Serialize};

use crate::playlist::PlaylistState;

/// Messages pushed from a station to its listeners
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"changeTrack","trackUrl":"a.mp3","duration":1000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StationEvent {
    /// Point-in-time position of the current track
    ///
    /// All fields are null while the station is idle.
    #[serde(rename_all = "camelCase")]
    Sync {
        elapsed_time: Option<u64>,
        track_url: Option<String>,
        duration: Option<u64>,
    },

    /// A new track became current (or the station went idle)
    #[serde(rename_all = "camelCase")]
    ChangeTrack {
        track_url: Option<String>,
        duration: Option<u64>,
    },
}

impl StationEvent {
    /// Snapshot of where playback is at `now_ms`
    pub fn sync(state: &PlaylistState, now_ms: i64) -> Self {
        match state.current_track() {
            Some(track) => StationEvent::Sync {
                elapsed_time: Some(state.elapsed_ms(now_ms)),
                track_url: Some(track.url.clone()),
                duration: Some(track.duration_ms),
            },
            None => StationEvent::Sync {
                elapsed_time: None,
                track_url: None,
                duration: None,
            },
        }
    }

    /// Announcement of the state's current track
    pub fn change_track(state: &PlaylistState) -> Self {
        let track = state.current_track();
        StationEvent::ChangeTrack {
            track_url: track.map(|t| t.url.clone()),
            duration: track.map(|t| t.duration_ms),
        }
    }

    /// Event type name as it appears on the wire
    pub fn type_str(&self) -> &'static str {
        match self {
            StationEvent::Sync { .. } => "sync",
            StationEvent::ChangeTrack { .. } => "changeTrack",
        }
    }
}

/// Messages a listener may send to its station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ask for a fresh `sync` addressed to this connection only
    RequestSync,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::Track;
    use serde_json::json;

    #[test]
    fn test_sync_wire_format() {
        let mut state = PlaylistState::empty(0);
        state.append(vec![Track::new("a.mp3", 5000)], 1000);

        let value = serde_json::to_value(StationEvent::sync(&state, 3500)).unwrap();
        assert_eq!(
            value,
            json!({"type": "sync", "elapsedTime": 2500, "trackUrl": "a.mp3", "duration": 5000})
        );
    }

    #[test]
    fn test_idle_sync_is_all_null() {
        let state = PlaylistState::empty(0);
        let value = serde_json::to_value(StationEvent::sync(&state, 10)).unwrap();
        assert_eq!(
            value,
            json!({"type": "sync", "elapsedTime": null, "trackUrl": null, "duration": null})
        );
    }

    #[test]
    fn test_change_track_wire_format() {
        let mut state = PlaylistState::empty(0);
        let event = StationEvent::change_track(&state);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "changeTrack", "trackUrl": null, "duration": null})
        );
        assert_eq!(event.type_str(), "changeTrack");

        state.append(vec![Track::new("b.mp3", 42)], 0);
        assert_eq!(
            serde_json::to_value(StationEvent::change_track(&state)).unwrap(),
            json!({"type": "changeTrack", "trackUrl": "b.mp3", "duration": 42})
        );
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"requestSync"}"#).unwrap();
        assert_eq!(msg, ClientMessage::RequestSync);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"skip"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("ping").is_err());
    }
}
