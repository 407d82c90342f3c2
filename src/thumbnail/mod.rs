//! Thumbnail service layer.
//!
//! This module turns a source image plus target dimensions and a fit mode
//! into an exact-size JPEG, and keeps generated thumbnails in an add-only
//! disk cache.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           Thumbnail Service             │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  Validator   │  │  ResizeEngine   │  │
//! │  │  (w, h, url) │  │  (Stretch/Crop/ │  │
//! │  │              │  │   Pad)          │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   CacheStore (cache_path + atomic I/O)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ThumbnailService`]: main entry point, orchestrates the pipeline
//! - [`RequestValidator`]: parses `w`/`h`/`url` and defends against path traversal
//! - [`ResizeEngine`]: exact-size resizing for each [`FitMode`]
//! - [`cache_path`]: deterministic cache file naming
//! - [`CacheStore`]: cache lookups and crash-safe persistence
//!
//! # Example
//!
//! ```
//! use thumbnail_server::thumbnail::{cache_path, FitMode};
//! use std::path::{Path, PathBuf};
//!
//! let path = cache_path(Path::new("/cache"), Path::new("photos/cat.png"), 100, 100, FitMode::Crop);
//! assert_eq!(path, PathBuf::from("/cache/photos/cat.png_100_100_Crop.jpg"));
//! ```

mod codec;
mod path;
mod request;
mod resize;
mod service;
mod store;

pub use codec::{
    clamp_quality, decode_source, encode_jpeg, encode_jpeg_to, is_valid_quality,
    DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use path::{cache_path, CACHE_FILE_EXTENSION};
pub use request::{
    normalize_relative_path, FitMode, RequestValidator, ThumbnailRequest,
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_DIMENSION,
};
pub use resize::{crop_region, pad_region, Rect, ResizeEngine, DEFAULT_BACKGROUND, RESAMPLE_FILTER};
pub use service::{ThumbnailConfig, ThumbnailResponse, ThumbnailService};
pub use store::{CacheStore, CachedThumbnail, PersistOutcome, TEMP_FILE_EXTENSION};
