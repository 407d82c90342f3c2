//! # Thumbnail Server
//!
//! An on-demand HTTP thumbnail server with an add-only disk cache.
//!
//! Given a source image path under an application root, a target width and
//! height, and a fit mode, the server returns an exact-size JPEG thumbnail.
//! Generated thumbnails are written to a cache directory with
//! crash-safe temp-file-then-rename writes and served from there afterwards.
//!
//! ## Features
//!
//! - **Three fit modes**: Stretch (`/d`), Crop (`/c`) and Pad (`/lw`)
//! - **Path safety**: absolute paths, URLs and `..` escapes are rejected
//! - **Deterministic cache keys**: `{cache_root}/{rel}_{w}_{h}_{Mode}.jpg`
//! - **Atomic persistence**: readers never observe a partially written file
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`thumbnail`] - Validation, resizing, cache naming, storage and the service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error type and its classification
//!
//! ## Example
//!
//! ```rust,no_run
//! use thumbnail_server::{create_router, RouterConfig, ThumbnailConfig, ThumbnailService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ThumbnailService::new(ThumbnailConfig::new("/srv/www", "/srv/www/PreImgTemp"));
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod thumbnail;

// Re-export commonly used types
pub use config::{parse_color, Cli, Command, RenderConfig, ServeConfig, StoreArgs};
pub use error::{ErrorKind, ThumbnailError};
pub use server::{
    create_router, crop_handler, fallback_handler, health_handler, pad_handler, stretch_handler,
    AppState, ErrorResponse, HealthResponse, RouterConfig, ThumbnailQueryParams,
};
pub use thumbnail::{
    cache_path, clamp_quality, crop_region, decode_source, encode_jpeg, is_valid_quality,
    normalize_relative_path, pad_region, CacheStore, CachedThumbnail, FitMode, PersistOutcome,
    Rect, RequestValidator, ResizeEngine, ThumbnailConfig, ThumbnailRequest, ThumbnailResponse,
    ThumbnailService, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
