//! API integration tests for thumbnail retrieval.
//!
//! Tests verify:
//! - Successful responses for each fit mode
//! - Output dimensions and pixel placement
//! - HTTP response codes and headers

use axum::http::StatusCode;

use super::test_utils::{
    banded_800x600, body_bytes, body_json, close_to, decode, get, gradient, is_valid_jpeg, solid,
    transparent, TestApp,
};

// =============================================================================
// Basic Retrieval
// =============================================================================

#[tokio::test]
async fn test_stretch_success_and_headers() {
    let app = TestApp::new();
    app.add_image("photos/cat.png", &gradient(320, 240));

    let response = get(app.router(), "/d?w=64&h=48&url=photos/cat.png").await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "image/jpeg");
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "public, max-age=604800"
    );
    assert!(headers.contains_key("expires"));
    assert!(headers.contains_key("last-modified"));
    assert_eq!(headers.get("x-thumbnail-cache-hit").unwrap(), "false");
    assert_eq!(headers.get("x-thumbnail-mode").unwrap(), "Stretch");

    let body = body_bytes(response).await;
    assert!(is_valid_jpeg(&body));
    let image = decode(&body);
    assert_eq!(image.dimensions(), (64, 48));
}

#[tokio::test]
async fn test_every_mode_returns_exact_size() {
    let app = TestApp::new();
    app.add_image("wide.png", &gradient(300, 100));
    app.add_image("tall.png", &gradient(90, 400));

    for route in ["d", "c", "lw"] {
        for source in ["wide.png", "tall.png"] {
            for (w, h) in [(100, 100), (37, 91), (120, 10), (1, 1)] {
                let uri = format!("/{}?w={}&h={}&url={}", route, w, h, source);
                let response = get(app.router(), &uri).await;
                assert_eq!(response.status(), StatusCode::OK, "{}", uri);

                let image = decode(&body_bytes(response).await);
                assert_eq!(image.dimensions(), (w, h), "{}", uri);
            }
        }
    }
}

#[tokio::test]
async fn test_crop_800x600_to_square_keeps_center() {
    let app = TestApp::new();
    app.add_image("banded.png", &banded_800x600());

    let response = get(app.router(), "/c?w=100&h=100&url=banded.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-thumbnail-mode").unwrap(), "Crop");

    let image = decode(&body_bytes(response).await);
    assert_eq!(image.dimensions(), (100, 100));
    for (x, y) in [(2, 50), (50, 50), (97, 50), (50, 2), (50, 97)] {
        assert!(
            close_to(image.get_pixel(x, y), [0, 255, 0], 40),
            "pixel ({}, {}) = {:?}",
            x,
            y,
            image.get_pixel(x, y)
        );
    }
}

#[tokio::test]
async fn test_stretch_800x600_keeps_side_bands() {
    let app = TestApp::new();
    app.add_image("banded.png", &banded_800x600());

    let response = get(app.router(), "/d?w=100&h=100&url=banded.png").await;
    let image = decode(&body_bytes(response).await);

    // Bands are 100/800 of the width: about 12px at 100px.
    assert!(close_to(image.get_pixel(3, 50), [255, 0, 0], 40));
    assert!(close_to(image.get_pixel(96, 50), [255, 0, 0], 40));
    assert!(close_to(image.get_pixel(50, 50), [0, 255, 0], 40));
}

#[tokio::test]
async fn test_pad_centers_on_white() {
    let app = TestApp::new();
    app.add_image("wide.png", &solid(200, 100, [0, 0, 255]));

    let response = get(app.router(), "/lw?w=100&h=100&url=wide.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-thumbnail-mode").unwrap(), "Pad");

    let image = decode(&body_bytes(response).await);
    assert_eq!(image.dimensions(), (100, 100));

    // Scaled content is 100x50 at y=25.
    assert!(close_to(image.get_pixel(50, 5), [255, 255, 255], 20));
    assert!(close_to(image.get_pixel(50, 94), [255, 255, 255], 20));
    assert!(close_to(image.get_pixel(50, 50), [0, 0, 255], 40));
}

#[tokio::test]
async fn test_transparent_source_becomes_background() {
    let app = TestApp::new();
    app.add_rgba_image("clear.png", &transparent(40, 40));

    let response = get(app.router(), "/d?w=20&h=20&url=clear.png").await;
    assert_eq!(response.status(), StatusCode::OK);

    let image = decode(&body_bytes(response).await);
    assert!(close_to(image.get_pixel(10, 10), [255, 255, 255], 10));
}

#[tokio::test]
async fn test_upscaling_is_allowed() {
    let app = TestApp::new();
    app.add_image("tiny.png", &gradient(4, 3));

    let response = get(app.router(), "/c?w=400&h=300&url=tiny.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(decode(&body_bytes(response).await).dimensions(), (400, 300));
}

#[tokio::test]
async fn test_percent_encoded_path() {
    let app = TestApp::new();
    app.add_image("my photos/cat 1.png", &gradient(30, 30));

    let response = get(app.router(), "/d?w=10&h=10&url=my%20photos%2Fcat%201.png").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_prefix_is_stripped() {
    let app = TestApp::new();
    app.add_image("img/a.png", &gradient(30, 30));

    let response = get(app.router(), "/d?w=10&h=10&url=~/img/a.png").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_uppercase_extension_accepted() {
    let app = TestApp::new();
    app.add_image("upper.png", &gradient(30, 30));
    std::fs::rename(app.root().join("upper.png"), app.root().join("UPPER.PNG")).unwrap();

    let response = get(app.router(), "/d?w=10&h=10&url=UPPER.PNG").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Health and Fallback
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let response = get(app.router(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new();

    let response = get(app.router(), "/thumbs?w=10&h=10&url=a.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "unknown_route");
    assert_eq!(json["status"], 404);
}
