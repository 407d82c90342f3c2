//! Integration tests for request validation and error mapping.
//!
//! Every rejection must happen before any image work or cache write, so each
//! test also checks that the cache directory was never created.

use axum::http::StatusCode;

use super::test_utils::{body_json, get, gradient, TestApp};

async fn assert_rejected(app: &TestApp, uri: &str, status: StatusCode, error: &str) {
    let response = get(app.router(), uri).await;
    assert_eq!(response.status(), status, "{}", uri);

    let json = body_json(response).await;
    assert_eq!(json["error"], error, "{}", uri);
    assert_eq!(json["status"], status.as_u16(), "{}", uri);
    assert!(json["message"].is_string());

    assert!(
        !app.cache_root().exists(),
        "cache created for rejected request {}",
        uri
    );
}

fn app_with_image() -> TestApp {
    let app = TestApp::new();
    app.add_image("img/photo.png", &gradient(50, 50));
    app
}

// =============================================================================
// Dimensions
// =============================================================================

#[tokio::test]
async fn test_invalid_dimensions_rejected() {
    let app = app_with_image();

    for query in [
        "w=0&h=10",
        "w=10&h=0",
        "w=-1&h=10",
        "w=10&h=-1",
        "w=abc&h=10",
        "w=10&h=1.5",
        "w=&h=10",
        "h=10",
        "w=10",
        "w=99999&h=10",
        "w=10&h=99999999999999999999",
    ] {
        let uri = format!("/c?{}&url=img/photo.png", query);
        assert_rejected(&app, &uri, StatusCode::BAD_REQUEST, "invalid_argument").await;
    }
}

#[tokio::test]
async fn test_malformed_query_is_json_400() {
    let app = app_with_image();

    for uri in [
        "/d?w=10&w=11&h=10&url=img/photo.png",
        "/c?w=10&h=10&url=img/photo.png&url=img/photo.png",
        "/lw?w=10&h=10&h=12&url=img/photo.png",
    ] {
        assert_rejected(&app, uri, StatusCode::BAD_REQUEST, "invalid_argument").await;
    }
}

// =============================================================================
// Paths
// =============================================================================

#[tokio::test]
async fn test_path_traversal_rejected() {
    let app = app_with_image();

    for url in [
        "../outside.png",
        "img/../../outside.png",
        "..%2Foutside.png",
        "%2E%2E%2Foutside.png",
        "..%5Coutside.png",
        "/etc/passwd.png",
        "%2Fetc%2Fpasswd.png",
        "http://example.com/a.png",
        "file:///etc/passwd.png",
    ] {
        let uri = format!("/d?w=10&h=10&url={}", url);
        assert_rejected(&app, &uri, StatusCode::BAD_REQUEST, "invalid_argument").await;
    }
}

#[tokio::test]
async fn test_missing_url_rejected() {
    let app = app_with_image();

    assert_rejected(&app, "/d?w=10&h=10", StatusCode::BAD_REQUEST, "invalid_argument").await;
    assert_rejected(&app, "/d?w=10&h=10&url=", StatusCode::BAD_REQUEST, "invalid_argument").await;
}

#[tokio::test]
async fn test_unsupported_extension_rejected() {
    let app = app_with_image();
    app.add_file("notes.txt", b"hello");

    assert_rejected(
        &app,
        "/d?w=10&h=10&url=notes.txt",
        StatusCode::BAD_REQUEST,
        "invalid_argument",
    )
    .await;
    assert_rejected(
        &app,
        "/d?w=10&h=10&url=img/photo",
        StatusCode::BAD_REQUEST,
        "invalid_argument",
    )
    .await;
}

#[tokio::test]
async fn test_missing_source_is_404() {
    let app = app_with_image();

    assert_rejected(
        &app,
        "/c?w=10&h=10&url=img/missing.png",
        StatusCode::NOT_FOUND,
        "not_found",
    )
    .await;
}

#[tokio::test]
async fn test_directory_source_is_404() {
    let app = app_with_image();
    std::fs::create_dir_all(app.root().join("folder.png")).unwrap();

    assert_rejected(
        &app,
        "/c?w=10&h=10&url=folder.png",
        StatusCode::NOT_FOUND,
        "not_found",
    )
    .await;
}

// =============================================================================
// Decoding
// =============================================================================

#[tokio::test]
async fn test_undecodable_source_is_415() {
    let app = app_with_image();
    app.add_file("broken.jpg", b"this is not a jpeg at all");

    assert_rejected(
        &app,
        "/lw?w=10&h=10&url=broken.jpg",
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "decode_failure",
    )
    .await;
}

#[tokio::test]
async fn test_traversal_checked_before_existence() {
    let app = app_with_image();

    // Outside the root and missing: still a 400, never a 404.
    assert_rejected(
        &app,
        "/d?w=10&h=10&url=../nope/nothing.png",
        StatusCode::BAD_REQUEST,
        "invalid_argument",
    )
    .await;
}
