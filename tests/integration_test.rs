//! Integration tests for the song link resolver
//!
//! These tests drive the full router against a temporary redb database and
//! the shipped templates:
//! - Song page rendering and click counting
//! - Raw redirects
//! - Landing page resolution
//! - Behaviour of misses and empty identifiers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use songlink::config::BackendKind;
use songlink::database::init_db;
use songlink::model::{Channel, Record};
use songlink::renderer::TemplateRenderer;
use songlink::route::create_app;
use songlink::service::Resolver;
use songlink::state::AppState;
use songlink::store::{self, DocumentStore, KeyValueStore, RecordStore};

const REDIRECT_BASE: &str = "https://open.spotify.com/intl-de/track/";

fn templates() -> TemplateRenderer {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
    TemplateRenderer::from_dir(&dir).expect("Failed to compile shipped templates")
}

fn hometown() -> Record {
    Record::new("hometown", "47x1Gh7yk5mblUWxWRdtjH").with_metadata("Hometown", "Cleopatrick", "")
}

/// Helper function to create a test application backed by a seeded document store
fn setup_test_app() -> (axum::Router, DocumentStore, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db = Arc::new(init_db(temp_db.path().to_str().unwrap()).expect("Failed to initialize test database"));

    let documents = DocumentStore::new(Arc::clone(&db));
    documents.insert_record(&hometown()).unwrap();

    let resolver = Resolver::new(
        store::open(BackendKind::Document, db),
        Arc::new(templates()),
        REDIRECT_BASE,
        Duration::from_secs(5),
    );

    (create_app(AppState::new(resolver)), documents, temp_db)
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// Polls until the detached increment lands or two seconds pass
async fn wait_for_clicks(store: &DocumentStore, id: &str, channel: Channel, expected: u64) -> u64 {
    let mut current = 0;
    for _ in 0..200 {
        current = store.lookup(id).await.unwrap().clicks(channel);
        if current == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    current
}

#[tokio::test]
async fn test_song_page_renders_and_counts() {
    let (app, documents, _temp_db) = setup_test_app();
    let prior = documents.lookup("hometown").await.unwrap().clicks(Channel::SongId);

    let response = get(&app, "/s/hometown").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let body = body_string(response.into_body()).await;
    assert!(body.contains("<h1>Hometown</h1>"));
    assert!(body.contains("/spotify?id=47x1Gh7yk5mblUWxWRdtjH"));

    assert_eq!(
        wait_for_clicks(&documents, "hometown", Channel::SongId, prior + 1).await,
        prior + 1
    );
    assert_eq!(documents.lookup("hometown").await.unwrap().clicks(Channel::SpotifyId), 0);
}

#[tokio::test]
async fn test_song_page_unknown_id() {
    let (app, _documents, _temp_db) = setup_test_app();

    let response = get(&app, "/s/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response.into_body()).await.is_empty());
}

#[tokio::test]
async fn test_song_page_empty_id() {
    let (app, documents, _temp_db) = setup_test_app();

    let response = get(&app, "/s/").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response.into_body()).await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(documents.lookup("hometown").await.unwrap().clicks(Channel::SongId), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_song_pages_count_twice() {
    let (app, documents, _temp_db) = setup_test_app();

    let (first, second) = tokio::join!(get(&app, "/s/hometown"), get(&app, "/s/hometown"));

    for response in [first, second] {
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response.into_body()).await.contains("Hometown"));
    }

    assert_eq!(wait_for_clicks(&documents, "hometown", Channel::SongId, 2).await, 2);
}

#[tokio::test]
async fn test_spotify_redirect() {
    let (app, _documents, _temp_db) = setup_test_app();

    let response = get(&app, "/spotify?id=4PkWff16v14sACvFBrKtI0").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://open.spotify.com/intl-de/track/4PkWff16v14sACvFBrKtI0"
    );
}

#[tokio::test]
async fn test_spotify_redirect_rejects_control_characters() {
    let (app, documents, _temp_db) = setup_test_app();

    let response = get(&app, "/spotify?id=abc%0Adef").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert!(body_string(response.into_body()).await.is_empty());

    // A record whose spotifyId holds the same bytes must stay uncounted
    documents
        .insert_record(&Record::new("control", "abc\ndef"))
        .unwrap();
    let response = get(&app, "/spotify?id=abc%0Adef").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(documents.lookup("control").await.unwrap().clicks(Channel::SpotifyId), 0);
}

#[tokio::test]
async fn test_repeated_id_uses_first_value() {
    let (app, _documents, _temp_db) = setup_test_app();

    let response = get(&app, "/spotify?id=first&id=second").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://open.spotify.com/intl-de/track/first"
    );

    let response = get(&app, "/?id=hometown&id=unknown").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response.into_body())
        .await
        .contains("/spotify?id=47x1Gh7yk5mblUWxWRdtjH"));
}

#[tokio::test]
async fn test_spotify_redirect_counts_known_track() {
    let (app, documents, _temp_db) = setup_test_app();

    let response = get(&app, "/spotify?id=47x1Gh7yk5mblUWxWRdtjH").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    assert_eq!(wait_for_clicks(&documents, "hometown", Channel::SpotifyId, 1).await, 1);
    assert_eq!(documents.lookup("hometown").await.unwrap().clicks(Channel::SongId), 0);
}

#[tokio::test]
async fn test_index_without_id() {
    let (app, _documents, _temp_db) = setup_test_app();

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response.into_body()).await.contains("Nothing to see here."));
}

#[tokio::test]
async fn test_index_resolves_id() {
    let (app, _documents, _temp_db) = setup_test_app();

    let response = get(&app, "/?id=hometown").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response.into_body())
        .await
        .contains("/spotify?id=47x1Gh7yk5mblUWxWRdtjH"));

    let response = get(&app, "/?id=unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_key_value_backend_serves_without_counting() {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db = Arc::new(init_db(temp_db.path().to_str().unwrap()).unwrap());
    KeyValueStore::new(Arc::clone(&db))
        .insert_link("high-tide", "4PkWff16v14sACvFBrKtI0")
        .unwrap();

    let resolver = Resolver::new(
        store::open(BackendKind::KeyValue, db),
        Arc::new(templates()),
        REDIRECT_BASE,
        Duration::from_secs(5),
    );
    let app = create_app(AppState::new(resolver));

    let response = get(&app, "/?id=high-tide").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response.into_body())
        .await
        .contains("/spotify?id=4PkWff16v14sACvFBrKtI0"));

    let response = get(&app, "/s/high-tide").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/spotify?id=4PkWff16v14sACvFBrKtI0").await;
    assert_eq!(response.status(), StatusCode::FOUND);
}
