//! End-to-end tests for the epoch store over a real HTTP origin.
//!
//! A throwaway Axum server on a loopback port plays the part of the
//! public ephemeris host and counts how often it is asked for the
//! document.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use iss_cache::{DatasetCache, MemoryCache};
use iss_core::{DATASET_CACHE_KEY, EpochStore, HttpOrigin, Loader, Origin, StoreError, Window};
use tokio::net::TcpListener;

const SAMPLE: &str = include_str!("../../../testdata/iss_oem_sample.xml");

async fn serve_document(hits: Arc<AtomicUsize>) -> SocketAddr {
    let router = Router::new()
        .route(
            "/ISS.OEM_J2K_EPH.xml",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                SAMPLE
            }),
        )
        .with_state(hits);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

fn http_store(addr: SocketAddr, cache: &MemoryCache) -> EpochStore {
    let origin = HttpOrigin::new(
        format!("http://{addr}/ISS.OEM_J2K_EPH.xml"),
        Duration::from_secs(5),
    )
    .unwrap();
    EpochStore::new(Loader::new(
        Origin::from(origin),
        DatasetCache::from(cache.clone()),
    ))
}

#[tokio::test]
async fn first_query_fetches_once_and_fills_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = serve_document(Arc::clone(&hits)).await;
    let cache = MemoryCache::new();
    let store = http_store(addr, &cache);

    let epochs = store.list_window(Window::default()).await.unwrap();
    assert_eq!(epochs.len(), 4);
    store.get_exact("2025-104T12:08:00.000Z").await.unwrap();
    store.time_range_summary().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(cache.get(DATASET_CACHE_KEY).await.is_some());
}

#[tokio::test]
async fn restart_with_warm_cache_skips_origin() {
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = serve_document(Arc::clone(&hits)).await;
    let cache = MemoryCache::new();

    let first = http_store(addr, &cache);
    let before = first.list_window(Window::default()).await.unwrap().to_vec();

    let restarted = http_store(addr, &cache);
    let after = restarted.list_window(Window::default()).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(restarted.loader().origin_fetches(), 0);
    assert_eq!(before.as_slice(), after);
}

#[tokio::test]
async fn concurrent_requests_share_one_fetch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = serve_document(Arc::clone(&hits)).await;
    let store = Arc::new(http_store(addr, &MemoryCache::new()));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    store.list_window(Window::default()).await.map(<[_]>::len)
                } else {
                    store
                        .get_nearest(chrono::Utc::now())
                        .await
                        .map(|_epoch| 1)
                }
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().unwrap() >= 1);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_origin_surfaces_and_is_retried_later() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = http_store(addr, &MemoryCache::new());
    let err = store.get_nearest(chrono::Utc::now()).await.unwrap_err();
    assert!(matches!(err, StoreError::OriginUnavailable(_)));
    assert!(!store.is_loaded());

    let _ = store.get_nearest(chrono::Utc::now()).await;
    assert_eq!(store.loader().origin_fetches(), 2);
}
