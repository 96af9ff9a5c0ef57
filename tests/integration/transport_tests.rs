//! HTTP transport integration tests against a local axum server.
//!
//! Tests verify:
//! - Successful responses carry body and content type
//! - Non-success statuses and timeouts map to transport errors
//! - A coordinator over the real transport fetches once and then serves
//!   from its persistent cache

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tempfile::TempDir;
use url::Url;

use netimage::error::TransportError;
use netimage::{
    FetchCoordinator, FetchRequest, HttpTransport, ImageCache, LoaderConfig, Target, Transport,
};

use super::test_utils::{init_tracing, png_bytes, RecordingSurface};

// =============================================================================
// Test Server
// =============================================================================

#[derive(Clone)]
struct ServerState {
    png: Bytes,
    hits: Arc<AtomicUsize>,
}

async fn image(State(state): State<ServerState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], state.png.clone())
}

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(10)).await;
    "late"
}

/// Serve the test routes on an ephemeral port.
async fn spawn_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = ServerState {
        png: png_bytes(6, 5, [40, 80, 120, 255]),
        hits: hits.clone(),
    };
    let app = Router::new()
        .route("/image.png", get(image))
        .route("/missing.png", get(missing))
        .route("/slow.png", get(slow))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn url_for(addr: SocketAddr, path: &str) -> Url {
    Url::parse(&format!("http://{addr}{path}")).unwrap()
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn test_fetch_returns_body_and_content_type() {
    init_tracing();
    let (addr, hits) = spawn_server().await;
    let transport = HttpTransport::new().unwrap();

    let request = FetchRequest::new(url_for(addr, "/image.png"), Duration::from_secs(5));
    let response = transport.fetch(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type.as_deref(), Some("image/png"));
    assert_eq!(response.bytes, png_bytes(6, 5, [40, 80, 120, 255]));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_is_status_error() {
    let (addr, _) = spawn_server().await;
    let transport = HttpTransport::new().unwrap();

    let request = FetchRequest::new(url_for(addr, "/missing.png"), Duration::from_secs(5));
    let err = transport.fetch(&request).await.unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let (addr, _) = spawn_server().await;
    let transport = HttpTransport::new().unwrap();

    let request = FetchRequest::new(url_for(addr, "/slow.png"), Duration::from_millis(200));
    let err = transport.fetch(&request).await.unwrap_err();

    assert!(matches!(err, TransportError::Timeout(_)));
}

#[tokio::test]
async fn test_connection_refused_is_connection_error() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new().unwrap();
    let request = FetchRequest::new(url_for(addr, "/image.png"), Duration::from_secs(5));
    let err = transport.fetch(&request).await.unwrap_err();

    assert!(matches!(err, TransportError::Connection(_)));
}

// =============================================================================
// End to End
// =============================================================================

#[tokio::test]
async fn test_coordinator_over_http_fetches_once() {
    init_tracing();
    let (addr, hits) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let config = LoaderConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..LoaderConfig::default()
    };

    let cache = Arc::new(ImageCache::from_config(&config));
    let transport = Arc::new(HttpTransport::from_config(&config).unwrap());
    let coordinator = FetchCoordinator::from_config(&config, cache.clone(), transport);

    let image_url = url_for(addr, "/image.png");

    let mut first = Target::new(RecordingSurface::view());
    coordinator.set_image(&mut first, image_url.as_str()).await;
    coordinator.settle(&mut first).await;
    assert_eq!(first.surface().last().unwrap().dimensions, (6, 5));

    // Wait for the background store before asking again
    let key = cache.key_for(&image_url);
    while !cache.memory().contains(&key).await {
        tokio::task::yield_now().await;
    }

    let mut second = Target::new(RecordingSurface::layer());
    coordinator.set_image(&mut second, image_url.as_str()).await;
    coordinator.settle(&mut second).await;

    assert_eq!(second.surface().last().unwrap().dimensions, (6, 5));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_coordinator_ignores_http_errors() {
    let (addr, _) = spawn_server().await;
    let cache = Arc::new(ImageCache::in_memory(1024 * 1024));
    let coordinator = FetchCoordinator::new(cache, Arc::new(HttpTransport::new().unwrap()));

    let mut target = Target::new(RecordingSurface::view());
    coordinator
        .set_image(&mut target, url_for(addr, "/missing.png").as_str())
        .await;
    coordinator.settle(&mut target).await;

    assert!(target.surface().assignments.is_empty());
    assert!(target.bound_url().is_none());
}
