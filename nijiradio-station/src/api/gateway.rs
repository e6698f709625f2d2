//! WebSocket push gateway
//!
//! Each socket gets a writer task draining a [`SocketSink`] and a reader
//! loop handling inbound frames. The sink is what the station's hub holds,
//! so broadcasts never touch the socket directly.

use axum::{
    extract::ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use nijiradio_common::ClientMessage;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::station::Station;
use crate::playback::SyncEngine;
use crate::push::SocketSink;

/// Application-level keepalive request and its reply
pub const KEEPALIVE_REQUEST: &str = "ping";
pub const KEEPALIVE_REPLY: &str = "pong";

/// GET /music - upgrade to a push connection
pub async fn music_socket(
    Station(engine): Station,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => ws.on_upgrade(move |socket| serve_socket(socket, engine)),
        Err(rejection) => {
            debug!("Non-WebSocket request on /music: {}", rejection.body_text());
            (StatusCode::UPGRADE_REQUIRED, "Expected WebSocket").into_response()
        }
    }
}

async fn serve_socket(socket: WebSocket, engine: Arc<SyncEngine>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sink, mut outbound) = SocketSink::channel();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if ws_tx.send(frame).await.is_err() {
                break;
            }
        }
    });

    let sink = Arc::new(sink);
    let id = match engine.connect(sink.clone()).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            debug!("Station '{}': connection closed before greeting", engine.name());
            writer.abort();
            return;
        }
        Err(e) => {
            warn!("Station '{}': refusing connection: {}", engine.name(), e);
            writer.abort();
            return;
        }
    };
    info!("Station '{}': listener {} connected", engine.name(), id);

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_text(&engine, &sink, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Station '{}': listener {} read error: {}", engine.name(), id, e);
                break;
            }
        }
    }

    engine.disconnect(id);
    writer.abort();
    info!("Station '{}': listener {} disconnected", engine.name(), id);
}

/// Inbound text frame, classified
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Keepalive,
    Client(ClientMessage),
    Unrecognized,
}

fn classify(text: &str) -> Inbound {
    if text == KEEPALIVE_REQUEST {
        return Inbound::Keepalive;
    }
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => Inbound::Client(message),
        Err(_) => Inbound::Unrecognized,
    }
}

async fn handle_text(engine: &SyncEngine, sink: &SocketSink, text: &str) {
    match classify(text) {
        Inbound::Keepalive => {
            let _ = sink.send_frame(Message::Text(KEEPALIVE_REPLY.to_string()));
        }
        Inbound::Client(ClientMessage::RequestSync) => {
            if let Err(e) = engine.request_sync(sink).await {
                warn!("Station '{}': requestSync failed: {}", engine.name(), e);
            }
        }
        Inbound::Unrecognized => {
            debug!("Station '{}': ignoring inbound frame: {}", engine.name(), text);
        }
    }
}
