//! Push connections and event fan-out
//!
//! A push connection is anything that can accept serialized
//! [`StationEvent`](nijiradio_common::StationEvent)s without blocking.
//! The [`BroadcastHub`] keeps the live set for one station and delivers
//! each event to every member at most once, best effort.

pub mod hub;
pub mod sink;

pub use hub::{BroadcastHub, ConnectionId};
pub use sink::{PushSink, SinkClosed, SocketSink};
