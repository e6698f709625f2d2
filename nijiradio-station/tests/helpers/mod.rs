//! Shared helpers for nijiradio-station integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use nijiradio_common::db::init_memory_database;
use nijiradio_common::SystemClock;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use nijiradio_station::api::{create_router, AppContext};
use nijiradio_station::playback::StationDirectory;

pub const DEFAULT_STATION: &str = "music-sync";

/// Application context over a fresh in-memory checkpoint database
pub async fn test_context() -> AppContext {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let stations = Arc::new(StationDirectory::new(pool, Arc::new(SystemClock)));
    AppContext::new(stations, DEFAULT_STATION)
}

pub async fn test_router() -> (Router, AppContext) {
    let ctx = test_context().await;
    (create_router(ctx.clone()), ctx)
}

/// Send one request through the router; returns status and body text
pub async fn make_request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<&str>,
    content_type: Option<&str>,
) -> (StatusCode, String) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }

    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// POST a JSON body
pub async fn post_json(app: &Router, path: &str, body: &str) -> (StatusCode, String) {
    make_request(app, Method::POST, path, Some(body), Some("application/json")).await
}

/// GET a path and parse the JSON reply
pub async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
    let (status, body) = make_request(app, Method::GET, path, None, None).await;
    let value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, value)
}

/// Urls of a `getPlaylist` reply (bare array) or a `getPlaylistState` reply
pub fn track_urls(playlist: &Value) -> Vec<String> {
    let tracks = match playlist {
        Value::Array(_) => playlist,
        _ => &playlist["tracks"],
    };
    tracks
        .as_array()
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|t| t["url"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// A server on an ephemeral local port, stopped with [`TestServer::stop`]
pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub ctx: AppContext,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let ctx = test_context().await;

        let served = ctx.clone();
        let handle = tokio::spawn(async move {
            nijiradio_station::api::serve(listener, served, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            ctx,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), self.handle).await;
    }
}
