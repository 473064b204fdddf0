//! Mock audio providers
//!
//! One mock plays both provider roles: it answers the extraction endpoint of
//! a primary host and the stream listing of a public endpoint, and serves the
//! media those point at. Signed URLs carry a sequence number so tests can
//! tell fresh URLs apart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use super::constants::{AUDIO_BYTES, SLOW_RESPONSE_SECS};
use super::server::{bind, MockServer};

/// Source ids with this prefix are unknown to every mock provider.
pub const UNKNOWN_SOURCE_PREFIX: &str = "missing-";

/// How a mock provider misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaBehavior {
    /// Everything works
    Serve,
    /// Extraction and listing endpoints answer 500
    MetadataError,
    /// Media URLs serve an HTML error page with status 200
    HtmlBody,
    /// The first N signed URLs answer 403, later ones work
    StaleUrls(usize),
    /// Media URLs serve an empty audio body
    EmptyBody,
    /// Extraction and listing endpoints answer after `SLOW_RESPONSE_SECS`
    Slow,
}

struct MediaState {
    base_url: String,
    behavior: MediaBehavior,
    metadata_calls: AtomicUsize,
    media_calls: AtomicUsize,
    issued_urls: Mutex<Vec<String>>,
}

pub struct MockMediaHost {
    pub base_url: String,
    state: Arc<MediaState>,
    _server: MockServer,
}

impl MockMediaHost {
    pub async fn spawn(behavior: MediaBehavior) -> Self {
        let (listener, base_url) = bind().await;
        let state = Arc::new(MediaState {
            base_url: base_url.clone(),
            behavior,
            metadata_calls: AtomicUsize::new(0),
            media_calls: AtomicUsize::new(0),
            issued_urls: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/extract/{id}", get(extract))
            .route("/streams/{id}", get(streams))
            .route("/media/{id}", get(media))
            .with_state(state.clone());

        let server = MockServer::serve(listener, base_url.clone(), app).await;
        Self {
            base_url,
            state,
            _server: server,
        }
    }

    /// Calls to the extraction or stream listing endpoint.
    pub fn metadata_calls(&self) -> usize {
        self.state.metadata_calls.load(Ordering::SeqCst)
    }

    /// Requests for media bytes, probes included.
    pub fn media_calls(&self) -> usize {
        self.state.media_calls.load(Ordering::SeqCst)
    }

    pub fn issued_urls(&self) -> Vec<String> {
        self.state.issued_urls.lock().unwrap().clone()
    }
}

fn issue_url(state: &MediaState, id: &str) -> Option<String> {
    let seq = state.metadata_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if state.behavior == MediaBehavior::MetadataError || id.starts_with(UNKNOWN_SOURCE_PREFIX) {
        return None;
    }
    let url = format!("{}/media/{}?sig={}", state.base_url, id, seq);
    state.issued_urls.lock().unwrap().push(url.clone());
    Some(url)
}

/// Hold the response back for slow hosts.
async fn delay(state: &MediaState) {
    if state.behavior == MediaBehavior::Slow {
        tokio::time::sleep(Duration::from_secs(SLOW_RESPONSE_SECS)).await;
    }
}

async fn extract(State(state): State<Arc<MediaState>>, Path(id): Path<String>) -> Response {
    let issued = issue_url(&state, &id);
    delay(&state).await;
    match issued {
        Some(url) => Json(json!({"url": url, "ext": "mp3"})).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "extractor crashed").into_response(),
    }
}

async fn streams(State(state): State<Arc<MediaState>>, Path(id): Path<String>) -> Response {
    let issued = issue_url(&state, &id);
    delay(&state).await;
    match issued {
        Some(url) => Json(json!({
            "title": "ignored",
            "audioStreams": [
                {"url": format!("{}/media/video", state.base_url), "bitrate": 999000,
                 "mimeType": "video/mp4", "videoOnly": true},
                {"url": url, "bitrate": 128000, "mimeType": "audio/mpeg", "videoOnly": false},
                {"url": format!("{}/media/low", state.base_url), "bitrate": 48000,
                 "mimeType": "audio/mp4", "videoOnly": false}
            ]
        }))
        .into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "listing unavailable").into_response(),
    }
}

async fn media(
    State(state): State<Arc<MediaState>>,
    Path(_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.media_calls.fetch_add(1, Ordering::SeqCst);
    let seq: usize = params
        .get("sig")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    match state.behavior {
        MediaBehavior::HtmlBody => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            "<html><body>Sign in to confirm you are not a bot</body></html>",
        )
            .into_response(),
        MediaBehavior::StaleUrls(stale) if seq <= stale => {
            (StatusCode::FORBIDDEN, "signature expired").into_response()
        }
        MediaBehavior::EmptyBody => {
            ([(header::CONTENT_TYPE, "audio/mpeg")], Vec::<u8>::new()).into_response()
        }
        _ => ([(header::CONTENT_TYPE, "audio/mpeg")], AUDIO_BYTES).into_response(),
    }
}
