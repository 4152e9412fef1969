//! HttpFetcher against a local server.

mod common;

use std::time::Duration;

use common::http_server::{self, Reply};
use tempfile::tempdir;
use woff2_capture::{AssetFetcher, FetchError, HttpFetcher};

#[tokio::test]
async fn streams_the_body_into_new_directories() {
    let body: Vec<u8> = (0u8..=255).cycle().take(64 * 1024).collect();
    let base = http_server::start(Reply::Body(body.clone()));
    let dir = tempdir().unwrap();
    let dest = dir.path().join("Acme-Sans").join("acme-sans-bold.woff2");

    HttpFetcher::default()
        .fetch(&format!("{base}/fonts/123/acme-sans-bold.woff2"), &dest)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn http_errors_leave_no_file() {
    let base = http_server::start(Reply::NotFound);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("missing.woff2");

    let err = HttpFetcher::default()
        .fetch(&format!("{base}/fonts/1/missing.woff2"), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn interrupted_stream_leaves_no_partial_file() {
    let base = http_server::start(Reply::Truncated {
        declared: 10_000,
        body: vec![7u8; 1_000],
    });
    let dir = tempdir().unwrap();
    let dest = dir.path().join("partial.woff2");

    let result = HttpFetcher::default()
        .fetch(&format!("{base}/fonts/1/partial.woff2"), &dest)
        .await;

    assert!(result.is_err());
    assert!(!dest.exists());
}

#[tokio::test]
async fn connection_failures_leave_no_file() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("nowhere.woff2");

    let err = HttpFetcher::default()
        .fetch(&format!("{}/fonts/1/nowhere.woff2", http_server::closed_url()), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http(_)));
    assert!(!dest.exists());
}

#[tokio::test]
async fn never_overwrites_an_existing_file() {
    let base = http_server::start(Reply::Body(b"new".to_vec()));
    let dir = tempdir().unwrap();
    let dest = dir.path().join("kept.woff2");
    std::fs::write(&dest, b"old").unwrap();

    let err = HttpFetcher::default()
        .fetch(&format!("{base}/fonts/1/kept.woff2"), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Io(_)));
    assert_eq!(std::fs::read(&dest).unwrap(), b"old");
}

#[tokio::test]
async fn checks_page_reachability() {
    let fetcher = HttpFetcher::default();
    let up = http_server::start(Reply::Body(b"<html></html>".to_vec()));
    let missing = http_server::start(Reply::NotFound);

    assert!(fetcher.is_reachable(&format!("{up}/foundry/acme/fonts/acme-sans/bold")).await);
    assert!(!fetcher.is_reachable(&format!("{missing}/foundry/acme/fonts/acme-sans/bold")).await);
    assert!(!fetcher.is_reachable(&http_server::closed_url()).await);
}

#[tokio::test]
async fn silent_page_is_unreachable_after_the_timeout() {
    let fetcher = HttpFetcher::default().with_reachability_timeout(Duration::from_millis(100));
    let silent = http_server::start(Reply::Stall);

    let reachable = tokio::time::timeout(
        Duration::from_secs(2),
        fetcher.is_reachable(&format!("{silent}/foundry/acme/fonts/acme-sans/bold")),
    )
    .await
    .expect("reachability check should give up on its own");

    assert!(!reachable);
}
