//! Mock catalog Web API
//!
//! Serves search, album, track and artwork endpoints shaped like the real
//! catalog. Every authenticated request is checked against a single accepted
//! bearer token and recorded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pezzottify_fetch::catalog::{CatalogError, CatalogToken, TokenSource};
use serde_json::{json, Value};

use super::constants::*;
use super::server::{bind, MockServer};

/// Knobs for the catalog fixture.
#[derive(Debug, Clone)]
pub struct CatalogFixture {
    pub accepted_token: String,
    /// Whether searches return the fixture track
    pub track_found: bool,
    /// Whether the album endpoint lists images
    pub album_images: bool,
}

impl Default for CatalogFixture {
    fn default() -> Self {
        Self {
            accepted_token: "token-1".to_string(),
            track_found: true,
            album_images: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub bearer: Option<String>,
    pub query: Option<String>,
}

struct CatalogState {
    base_url: String,
    fixture: CatalogFixture,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockCatalog {
    pub base_url: String,
    state: Arc<CatalogState>,
    _server: MockServer,
}

impl MockCatalog {
    pub async fn spawn(fixture: CatalogFixture) -> Self {
        let (listener, base_url) = bind().await;
        let state = Arc::new(CatalogState {
            base_url: base_url.clone(),
            fixture,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/search", get(search))
            .route("/albums/{id}", get(album))
            .route("/tracks/{id}", get(track))
            .route("/artwork/{name}", get(artwork))
            .with_state(state.clone());

        let server = MockServer::serve(listener, base_url.clone(), app).await;
        Self {
            base_url,
            state,
            _server: server,
        }
    }

    /// All requests that reached an authenticated endpoint, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }
}

fn track_json(base_url: &str) -> Value {
    json!({
        "id": TRACK_ID,
        "name": TRACK_NAME,
        "duration_ms": TRACK_DURATION_MS,
        "artists": [{"name": TRACK_ARTIST}],
        "album": {
            "id": ALBUM_ID,
            "name": ALBUM_NAME,
            "images": [
                {"url": format!("{}/artwork/small.jpg", base_url), "width": 64, "height": 64}
            ]
        },
        "external_ids": {"isrc": TRACK_ISRC}
    })
}

/// Record the request and check its bearer token.
fn authorize(
    state: &CatalogState,
    path: String,
    headers: &HeaderMap,
    query: Option<String>,
) -> Result<(), Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        path,
        bearer: bearer.clone(),
        query,
    });

    if bearer.as_deref() == Some(state.fixture.accepted_token.as_str()) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid access token").into_response())
    }
}

async fn search(
    State(state): State<Arc<CatalogState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejected) = authorize(&state, "/search".into(), &headers, params.get("q").cloned())
    {
        return rejected;
    }

    let items = if state.fixture.track_found {
        vec![track_json(&state.base_url)]
    } else {
        vec![]
    };
    Json(json!({"tracks": {"items": items}})).into_response()
}

async fn album(
    State(state): State<Arc<CatalogState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejected) = authorize(&state, format!("/albums/{}", id), &headers, None) {
        return rejected;
    }

    let images = if state.fixture.album_images {
        json!([
            {"url": format!("{}/artwork/small.jpg", state.base_url), "width": 64, "height": 64},
            {"url": format!("{}/artwork/large.jpg", state.base_url), "width": 640, "height": 640}
        ])
    } else {
        json!([])
    };
    Json(json!({"id": id, "name": ALBUM_NAME, "images": images})).into_response()
}

async fn track(
    State(state): State<Arc<CatalogState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejected) = authorize(&state, format!("/tracks/{}", id), &headers, None) {
        return rejected;
    }
    Json(track_json(&state.base_url)).into_response()
}

async fn artwork(Path(_name): Path<String>) -> Response {
    ([(header::CONTENT_TYPE, "image/jpeg")], ARTWORK_BYTES).into_response()
}

/// Token source handing out a fixed sequence of tokens, repeating the last.
pub struct SequenceTokenSource {
    tokens: Vec<String>,
    ttl_secs: i64,
    calls: Arc<AtomicUsize>,
}

impl SequenceTokenSource {
    pub fn new(tokens: &[&str], ttl_secs: i64) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                tokens: tokens.iter().map(|t| t.to_string()).collect(),
                ttl_secs,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl TokenSource for SequenceTokenSource {
    async fn fetch_token(&self) -> Result<CatalogToken, CatalogError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let token = self
            .tokens
            .get(n)
            .or_else(|| self.tokens.last())
            .cloned()
            .ok_or_else(|| CatalogError::Auth("no tokens".into()))?;
        Ok(CatalogToken {
            access_token: token,
            expires_at: chrono::Utc::now().timestamp() + self.ttl_secs,
        })
    }
}
