//! Connection handles used by the broadcast hub

use axum::extract::ws::Message;
use thiserror::Error;
use tokio::sync::mpsc;

/// The connection behind a sink is gone
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("push connection closed")]
pub struct SinkClosed;

/// Handle to one live push connection
///
/// `send` must not block: it queues the payload for the connection's own
/// writer and reports only whether the connection can still accept it.
pub trait PushSink: Send + Sync {
    fn send(&self, payload: &str) -> Result<(), SinkClosed>;

    fn is_alive(&self) -> bool;
}

/// Sink feeding a WebSocket writer task
#[derive(Clone)]
pub struct SocketSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl SocketSink {
    /// Create a sink and the receiver its writer task drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a raw frame (keepalive replies, close frames)
    pub fn send_frame(&self, message: Message) -> Result<(), SinkClosed> {
        self.tx.send(message).map_err(|_| SinkClosed)
    }
}

impl PushSink for SocketSink {
    fn send(&self, payload: &str) -> Result<(), SinkClosed> {
        self.send_frame(Message::Text(payload.to_owned()))
    }

    fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}
