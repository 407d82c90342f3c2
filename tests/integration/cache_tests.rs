//! Cache behavior integration tests.
//!
//! Tests verify:
//! - Cache file naming and location
//! - Cache hits serve the stored bytes unchanged
//! - Concurrent generation of one key leaves a single valid file
//! - No temp files survive

use std::time::Duration;

use axum::http::StatusCode;

use thumbnail_server::thumbnail::{FitMode, PersistOutcome};

use super::test_utils::{
    body_bytes, decode, get, gradient, is_valid_jpeg, temp_files_under, wait_for_cache, TestApp,
};

// =============================================================================
// Naming and Hits
// =============================================================================

#[tokio::test]
async fn test_cache_file_written_at_expected_path() {
    let app = TestApp::new();
    app.add_image("photos/cat.png", &gradient(120, 90));

    let response = get(app.router(), "/c?w=100&h=100&url=photos/cat.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    let served = body_bytes(response).await;

    let cache_file = app.cache_file("photos/cat.png", 100, 100, "Crop");
    assert!(wait_for_cache(&cache_file, &app.cache_root()).await);
    assert_eq!(std::fs::read(&cache_file).unwrap(), served.to_vec());
}

#[tokio::test]
async fn test_second_request_is_cache_hit() {
    let app = TestApp::new();
    app.add_image("a.png", &gradient(64, 64));
    let router = app.router();

    let first = get(router.clone(), "/lw?w=30&h=20&url=a.png").await;
    assert_eq!(first.headers().get("x-thumbnail-cache-hit").unwrap(), "false");
    let first_body = body_bytes(first).await;

    let cache_file = app.cache_file("a.png", 30, 20, "Pad");
    assert!(wait_for_cache(&cache_file, &app.cache_root()).await);

    let second = get(router, "/lw?w=30&h=20&url=a.png").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-thumbnail-cache-hit").unwrap(), "true");
    assert_eq!(body_bytes(second).await, first_body);
}

#[tokio::test]
async fn test_cache_hit_serves_stored_bytes_verbatim() {
    let app = TestApp::new();
    app.add_image("a.png", &gradient(64, 64));

    // A pre-existing cache file wins over regeneration.
    let cache_file = app.cache_file("a.png", 10, 10, "Stretch");
    std::fs::create_dir_all(cache_file.parent().unwrap()).unwrap();
    let planted = {
        let mut data = Vec::new();
        gradient(10, 10)
            .write_to(&mut std::io::Cursor::new(&mut data), image::ImageFormat::Jpeg)
            .unwrap();
        data
    };
    std::fs::write(&cache_file, &planted).unwrap();

    let response = get(app.router(), "/d?w=10&h=10&url=a.png").await;
    assert_eq!(response.headers().get("x-thumbnail-cache-hit").unwrap(), "true");
    assert_eq!(body_bytes(response).await.to_vec(), planted);
}

#[tokio::test]
async fn test_modes_and_sizes_cached_independently() {
    let app = TestApp::new();
    app.add_image("img/a.png", &gradient(80, 60));
    let router = app.router();

    for uri in [
        "/d?w=10&h=10&url=img/a.png",
        "/c?w=10&h=10&url=img/a.png",
        "/lw?w=10&h=10&url=img/a.png",
        "/d?w=11&h=10&url=img/a.png",
    ] {
        assert_eq!(get(router.clone(), uri).await.status(), StatusCode::OK);
    }

    for (w, h, mode) in [
        (10, 10, "Stretch"),
        (10, 10, "Crop"),
        (10, 10, "Pad"),
        (11, 10, "Stretch"),
    ] {
        let path = app.cache_file("img/a.png", w, h, mode);
        assert!(wait_for_cache(&path, &app.cache_root()).await, "{:?}", path);
    }
}

// =============================================================================
// Idempotence and Concurrency
// =============================================================================

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let app = TestApp::new();
    app.add_image("a.png", &gradient(200, 150));
    let router = app.router();

    let first = body_bytes(get(router.clone(), "/c?w=50&h=50&url=a.png").await).await;
    for _ in 0..3 {
        let again = body_bytes(get(router.clone(), "/c?w=50&h=50&url=a.png").await).await;
        assert_eq!(again, first);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_same_key() {
    let app = TestApp::new();
    app.add_image("shared.png", &gradient(400, 300));
    let router = app.router();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move {
                let response = get(router, "/c?w=64&h=64&url=shared.png").await;
                assert_eq!(response.status(), StatusCode::OK);
                body_bytes(response).await
            })
        })
        .collect();

    let mut bodies = Vec::new();
    for handle in handles {
        bodies.push(handle.await.unwrap());
    }

    for body in &bodies {
        assert!(is_valid_jpeg(body));
        assert_eq!(body, &bodies[0]);
    }

    let cache_file = app.cache_file("shared.png", 64, 64, "Crop");
    assert!(wait_for_cache(&cache_file, &app.cache_root()).await);

    let cached = std::fs::read(&cache_file).unwrap();
    assert_eq!(decode(&cached).dimensions(), (64, 64));
    assert!(temp_files_under(&app.cache_root()).is_empty());
}

// =============================================================================
// Service-Level Persistence
// =============================================================================

#[tokio::test]
async fn test_pending_write_reports_outcome() {
    let app = TestApp::new();
    app.add_image("a.png", &gradient(40, 40));
    let service = app.service();

    let response = service
        .get_thumbnail(Some("20"), Some("20"), Some("a.png"), FitMode::Crop)
        .await
        .unwrap();
    assert!(!response.cache_hit);

    let outcome = tokio::time::timeout(Duration::from_secs(5), response.pending_write.unwrap())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, PersistOutcome::Written);
    assert!(temp_files_under(&app.cache_root()).is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unwritable_cache_still_serves() {
    let app = TestApp::new();
    app.add_image("a.png", &gradient(40, 40));

    // A regular file where the cache directory should be.
    std::fs::write(app.cache_root(), b"not a directory").unwrap();

    let service = app.service();
    let response = service
        .get_thumbnail(Some("20"), Some("20"), Some("a.png"), FitMode::Stretch)
        .await
        .unwrap();
    assert!(is_valid_jpeg(&response.data));

    let result = response.pending_write.unwrap().await.unwrap();
    assert!(result.is_err());
}
