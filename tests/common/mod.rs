//! Fake upstream servers for integration tests.
//!
//! Each fake is a small axum app bound to a random local port. Servers shut
//! down when their handle is dropped.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use spotify_album_scores::config::Config;

pub const TEST_TOKEN: &str = "test-token";

/// A listener that is bound but not yet serving, so its URL can be handed to
/// the app it will serve.
pub struct PendingServer {
    listener: TcpListener,
    pub base_url: String,
}

pub struct FakeServer {
    pub base_url: String,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl PendingServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        Self {
            listener,
            base_url: format!("http://127.0.0.1:{}", port),
        }
    }

    pub fn serve(self, app: Router) -> FakeServer {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(self.listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });
        FakeServer {
            base_url: self.base_url,
            _shutdown_tx: shutdown_tx,
        }
    }
}

impl FakeServer {
    pub async fn spawn(app: Router) -> Self {
        PendingServer::bind().await.serve(app)
    }
}

pub fn album(id: &str, release_date: &str, total_tracks: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Album {}", id),
        "release_date": release_date,
        "total_tracks": total_tracks,
        "album_type": "album",
        "images": [{ "url": format!("https://i.scdn.co/image/{}", id), "width": 640, "height": 640 }],
        "external_urls": { "spotify": format!("https://open.spotify.com/album/{}", id) }
    })
}

/// Canned Spotify behaviour.
#[derive(Clone)]
pub struct SpotifyFixture {
    /// `None` makes the token endpoint fail.
    pub token: Option<String>,
    /// Raw 200 body sent by the token endpoint instead of a well-formed one.
    pub token_body: Option<String>,
    pub artist_ids: Vec<String>,
    pub search_status: StatusCode,
    /// Sent by artist search instead of the generated result list.
    pub search_body: Option<Value>,
    pub albums: Vec<Value>,
    pub albums_status: StatusCode,
    /// Sent by the album listing instead of `{ "items": albums }`.
    pub albums_body: Option<Value>,
}

impl Default for SpotifyFixture {
    fn default() -> Self {
        Self {
            token: Some(TEST_TOKEN.into()),
            token_body: None,
            artist_ids: vec!["artist-1".into(), "artist-2".into()],
            search_status: StatusCode::OK,
            search_body: None,
            albums: vec![
                album("A", "2001-05-21", 12),
                album("B", "1997-06-16", 12),
                album("C", "1995-03-13", 12),
            ],
            albums_status: StatusCode::OK,
            albums_body: None,
        }
    }
}

/// Request counters observed by the fake Spotify.
#[derive(Default)]
pub struct SpotifyHits {
    pub token: AtomicUsize,
    pub search: AtomicUsize,
    pub albums: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl SpotifyHits {
    pub fn catalog_requests(&self) -> usize {
        self.search.load(Ordering::SeqCst) + self.albums.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct SpotifyState {
    fixture: SpotifyFixture,
    hits: Arc<SpotifyHits>,
}

fn authorized(headers: &HeaderMap, fixture: &SpotifyFixture) -> bool {
    let expected = fixture.token.as_deref().map(|t| format!("Bearer {}", t));
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        == expected
}

async fn token(State(state): State<SpotifyState>, headers: HeaderMap) -> Response {
    state.hits.token.fetch_add(1, Ordering::SeqCst);
    if let Some(body) = &state.fixture.token_body {
        return ([("content-type", "application/json")], body.clone()).into_response();
    }
    let basic = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h.starts_with("Basic "));
    match (&state.fixture.token, basic) {
        (Some(token), true) => Json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_client" }))).into_response(),
    }
}

async fn search(
    State(state): State<SpotifyState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.hits.search.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers, &state.fixture) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if params.get("type").map(String::as_str) != Some("artist") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let q = params.get("q").cloned().unwrap_or_default();
    state.hits.queries.lock().unwrap().push(q);
    if !state.fixture.search_status.is_success() {
        return (state.fixture.search_status, "search unavailable").into_response();
    }
    if let Some(body) = &state.fixture.search_body {
        return Json(body.clone()).into_response();
    }

    let items: Vec<Value> = state
        .fixture
        .artist_ids
        .iter()
        .map(|id| json!({ "id": id, "name": format!("Artist {}", id), "type": "artist" }))
        .collect();
    Json(json!({ "artists": { "items": items, "total": items.len() } })).into_response()
}

async fn albums(
    State(state): State<SpotifyState>,
    Path(artist_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.hits.albums.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers, &state.fixture) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let filtered = params.get("include_groups").map(String::as_str) == Some("album")
        && params.get("market").map(String::as_str) == Some("US")
        && params.get("limit").map(String::as_str) == Some("50");
    if !filtered || !state.fixture.artist_ids.contains(&artist_id) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if !state.fixture.albums_status.is_success() {
        return (state.fixture.albums_status, "upstream broke").into_response();
    }
    if let Some(body) = &state.fixture.albums_body {
        return Json(body.clone()).into_response();
    }
    Json(json!({ "items": state.fixture.albums, "limit": 50, "offset": 0 })).into_response()
}

pub async fn spawn_spotify(fixture: SpotifyFixture) -> (FakeServer, Arc<SpotifyHits>) {
    let hits = Arc::new(SpotifyHits::default());
    let app = Router::new()
        .route("/api/token", post(token))
        .route("/v1/search", get(search))
        .route("/v1/artists/:id/albums", get(albums))
        .with_state(SpotifyState {
            fixture,
            hits: hits.clone(),
        });
    (FakeServer::spawn(app).await, hits)
}

/// Score service answering every `/recommend` with a fixed status and body.
/// Returns the artist ids it was asked about.
pub async fn spawn_score_service(status: StatusCode, body: String) -> (FakeServer, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let app = Router::new().route(
        "/recommend",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let recorded = recorded.clone();
            let body = body.clone();
            async move {
                recorded
                    .lock()
                    .unwrap()
                    .push(params.get("artist_id").cloned().unwrap_or_default());
                (status, [("content-type", "application/json")], body)
            }
        }),
    );
    (FakeServer::spawn(app).await, seen)
}

pub fn config(spotify: &FakeServer, backend_url: &str, model_path: PathBuf) -> Config {
    Config {
        port: 0,
        spotify_client_id: "client-id".into(),
        spotify_client_secret: "client-secret".into(),
        accounts_url: format!("{}/api/token", spotify.base_url),
        api_base: format!("{}/v1", spotify.base_url),
        backend_url: backend_url.into(),
        model_path,
    }
}

/// Backend URL nothing listens on.
pub const DEAD_BACKEND: &str = "http://127.0.0.1:1";
