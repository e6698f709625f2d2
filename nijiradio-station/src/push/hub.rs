//! Broadcast hub for one station's push connections

use nijiradio_common::StationEvent;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sink::PushSink;

/// Identifier assigned to a registered connection
pub type ConnectionId = Uuid;

/// Registry of live push connections with fire-and-forget fan-out
///
/// No acknowledgement and no backpressure: a connection that misses an
/// event catches up on its next `requestSync` or the next broadcast.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    sinks: Arc<RwLock<HashMap<ConnectionId, Arc<dyn PushSink>>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection, greeting it first with `greeting`
    ///
    /// A connection that cannot take the greeting is not registered.
    pub fn register(&self, sink: Arc<dyn PushSink>, greeting: &StationEvent) -> Option<ConnectionId> {
        if !Self::send_to(sink.as_ref(), greeting) {
            return None;
        }

        let id = Uuid::new_v4();
        let total = {
            let mut sinks = self.write_sinks();
            sinks.insert(id, sink);
            sinks.len()
        };
        info!("Push connection {} registered, total connections: {}", id, total);
        Some(id)
    }

    /// Remove a connection; returns whether it was still registered
    pub fn deregister(&self, id: ConnectionId) -> bool {
        let removed = self.write_sinks().remove(&id).is_some();
        if removed {
            info!("Push connection {} closed, total connections: {}", id, self.connection_count());
        }
        removed
    }

    /// Deliver `event` to every live connection
    ///
    /// The event is serialized once. A failing connection is logged and
    /// dropped without affecting delivery to the others. Returns the number
    /// of connections that accepted the event.
    pub fn broadcast(&self, event: &StationEvent) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event.type_str(), e);
                return 0;
            }
        };

        let targets: Vec<(ConnectionId, Arc<dyn PushSink>)> = self
            .read_sinks()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, sink) in targets {
            if !sink.is_alive() {
                dead.push(id);
                continue;
            }
            match sink.send(&payload) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Failed to deliver {} to {}: {}", event.type_str(), id, e);
                    dead.push(id);
                }
            }
        }

        if !dead.is_empty() {
            let mut sinks = self.write_sinks();
            for id in &dead {
                sinks.remove(id);
            }
        }

        debug!("Broadcast {} to {} connections", event.type_str(), delivered);
        delivered
    }

    /// Deliver `event` to a single connection
    pub fn send_to(sink: &dyn PushSink, event: &StationEvent) -> bool {
        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event.type_str(), e);
                return false;
            }
        };

        match sink.send(&payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to deliver {}: {}", event.type_str(), e);
                false
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.read_sinks().len()
    }

    // Poisoned locks are recovered: every update is a single map operation
    fn read_sinks(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ConnectionId, Arc<dyn PushSink>>> {
        self.sinks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_sinks(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ConnectionId, Arc<dyn PushSink>>> {
        self.sinks.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording sinks for hub and engine tests

    use super::super::sink::{PushSink, SinkClosed};
    use nijiradio_common::StationEvent;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingSink {
        received: Mutex<Vec<String>>,
        closed: AtomicBool,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<StationEvent> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .map(|raw| serde_json::from_str(raw).unwrap())
                .collect()
        }

        pub fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    impl PushSink for RecordingSink {
        fn send(&self, payload: &str) -> Result<(), SinkClosed> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(SinkClosed);
            }
            self.received.lock().unwrap().push(payload.to_string());
            Ok(())
        }

        fn is_alive(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }
    }

    /// Claims to be alive but rejects every payload
    pub struct BrokenSink;

    impl PushSink for BrokenSink {
        fn send(&self, _payload: &str) -> Result<(), SinkClosed> {
            Err(SinkClosed)
        }

        fn is_alive(&self) -> bool {
            true
        }
    }
}
