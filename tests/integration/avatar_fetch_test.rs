// Integration tests for the HTTP avatar fetcher against local stub servers

use super::avatar_server::{self, solid_png, Behavior};
use imgwelcome::banner::{AvatarFetcher, FetchErrorKind, HttpAvatarFetcher};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_fetch_decodes_png() {
    let server = avatar_server::spawn(Behavior::Body(solid_png(40, 30, [9, 8, 7, 255]))).await;
    let fetcher = HttpAvatarFetcher::new().unwrap();

    let avatar = fetcher
        .fetch(&server.url(), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!((avatar.image.width(), avatar.image.height()), (40, 30));
    assert!(!avatar.bytes.is_empty());
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_fetch_404_is_http_error_with_status() {
    let server = avatar_server::spawn(Behavior::Status(404)).await;
    let fetcher = HttpAvatarFetcher::new().unwrap();

    let err = fetcher
        .fetch(&server.url(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Http);
    assert_eq!(err.status, Some(404));
}

#[tokio::test]
async fn test_fetch_times_out_without_retrying() {
    let server = avatar_server::spawn(Behavior::Slow(
        Duration::from_secs(10),
        solid_png(8, 8, [0, 0, 0, 255]),
    ))
    .await;
    let fetcher = HttpAvatarFetcher::new().unwrap();

    let started = Instant::now();
    let err = fetcher
        .fetch(&server.url(), Duration::from_millis(300))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_fetch_non_image_body_is_decode_error() {
    let server = avatar_server::spawn(Behavior::Body(b"<html>nope</html>".to_vec())).await;
    let fetcher = HttpAvatarFetcher::new().unwrap();

    let err = fetcher
        .fetch(&server.url(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Decode);
}

#[tokio::test]
async fn test_fetch_rejects_oversized_body() {
    let server = avatar_server::spawn(Behavior::Body(solid_png(64, 64, [1, 1, 1, 255]))).await;
    let fetcher = HttpAvatarFetcher::new().unwrap().with_max_bytes(16);

    let err = fetcher
        .fetch(&server.url(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FetchErrorKind::Decode);
}
