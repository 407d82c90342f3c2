//! Thumbnail Service for orchestrating thumbnail generation.
//!
//! The ThumbnailService is the seam between the HTTP layer and the core. Per
//! request it runs:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       ThumbnailService                           │
//! │  1. Validate params        4. Decode source                      │
//! │  2. Derive cache path      5. Resize (Stretch | Crop | Pad)      │
//! │  3. Serve cached file      6. Encode, return, persist in back-   │
//! │     if present                ground                             │
//! │           │                       │                     │        │
//! │           ▼                       ▼                     ▼        │
//! │   ┌──────────────────┐   ┌──────────────┐    ┌──────────────┐    │
//! │   │ RequestValidator │   │ ResizeEngine │    │  CacheStore  │    │
//! │   └──────────────────┘   └──────────────┘    └──────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All of this is blocking CPU and file work, so it runs on tokio's blocking
//! pool. There is no in-memory index and no per-key locking: concurrent misses
//! for the same key each regenerate and each persist.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use image::{Rgb, RgbImage};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::ThumbnailError;

use super::codec::{decode_source, encode_jpeg, DEFAULT_JPEG_QUALITY};
use super::request::{FitMode, RequestValidator, ThumbnailRequest, DEFAULT_MAX_DIMENSION};
use super::resize::{ResizeEngine, DEFAULT_BACKGROUND};
use super::store::{CacheStore, PersistOutcome};

// =============================================================================
// Configuration
// =============================================================================

/// Immutable settings injected into [`ThumbnailService`].
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Directory source paths are resolved against
    pub app_root: PathBuf,

    /// Directory cached thumbnails are written under
    pub cache_root: PathBuf,

    /// JPEG quality (0-100)
    pub quality: u8,

    /// Fill color for padding and transparent pixels
    pub background: Rgb<u8>,

    /// Accepted source extensions, without dots
    pub allowed_extensions: Vec<String>,

    /// Largest accepted width or height
    pub max_dimension: u32,
}

impl ThumbnailConfig {
    /// Create a configuration with default quality, background and limits.
    pub fn new(app_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            cache_root: cache_root.into(),
            quality: DEFAULT_JPEG_QUALITY,
            background: DEFAULT_BACKGROUND,
            allowed_extensions: super::request::DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn with_allowed_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allowed_extensions = extensions;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

// =============================================================================
// Thumbnail Response
// =============================================================================

/// Response from the thumbnail service.
#[derive(Debug)]
pub struct ThumbnailResponse {
    /// Encoded JPEG bytes
    pub data: Bytes,

    /// Whether the bytes came from the disk cache
    pub cache_hit: bool,

    /// When the thumbnail was generated
    pub last_modified: SystemTime,

    /// Fit mode used
    pub mode: FitMode,

    /// Background persistence of a freshly generated thumbnail.
    ///
    /// `None` on cache hits. Dropping the handle detaches the task; the write
    /// still completes and failures are logged.
    pub pending_write: Option<JoinHandle<Result<PersistOutcome, ThumbnailError>>>,
}

/// Outcome of the blocking part of a request.
enum Produced {
    Hit {
        data: Bytes,
        modified: SystemTime,
    },
    Miss {
        data: Bytes,
        cache_path: PathBuf,
    },
}

// =============================================================================
// Thumbnail Service
// =============================================================================

/// Service for generating and caching thumbnails.
///
/// # Example
///
/// ```ignore
/// use thumbnail_server::thumbnail::{FitMode, ThumbnailConfig, ThumbnailService};
///
/// let service = ThumbnailService::new(ThumbnailConfig::new("/srv/www", "/srv/www/PreImgTemp"));
///
/// let response = service
///     .get_thumbnail(Some("100"), Some("100"), Some("photos/cat.jpg"), FitMode::Crop)
///     .await?;
///
/// println!("{} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
#[derive(Debug, Clone)]
pub struct ThumbnailService {
    validator: RequestValidator,
    engine: ResizeEngine,
    store: CacheStore,
    quality: u8,
}

impl ThumbnailService {
    /// Create a service from its configuration.
    pub fn new(config: ThumbnailConfig) -> Self {
        let validator = RequestValidator::new(config.app_root)
            .with_allowed_extensions(config.allowed_extensions)
            .with_max_dimension(config.max_dimension);

        Self {
            validator,
            engine: ResizeEngine::new(config.background),
            store: CacheStore::new(config.cache_root),
            quality: config.quality,
        }
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub fn engine(&self) -> &ResizeEngine {
        &self.engine
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Cache file location for a validated request.
    pub fn cache_path(&self, request: &ThumbnailRequest) -> PathBuf {
        request.cache_path(self.store.root())
    }

    /// Decode the source and resize it, bypassing the cache.
    ///
    /// The decoded source is dropped as soon as the output exists.
    pub fn render(&self, request: &ThumbnailRequest) -> Result<RgbImage, ThumbnailError> {
        let source = decode_source(request)?;
        self.engine
            .resize(&source, request.width(), request.height(), request.mode())
    }

    /// Get a thumbnail, serving from the disk cache when possible.
    ///
    /// On a miss the freshly encoded bytes are returned right away and written
    /// to the cache on a separate blocking task (see
    /// [`ThumbnailResponse::pending_write`]). A persistence failure never
    /// fails the request.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any image work. Decode, encode
    /// and cache-read failures are returned as-is; nothing is retried.
    pub async fn get_thumbnail(
        &self,
        width: Option<&str>,
        height: Option<&str>,
        url: Option<&str>,
        mode: FitMode,
    ) -> Result<ThumbnailResponse, ThumbnailError> {
        let service = self.clone();
        let width = width.map(str::to_owned);
        let height = height.map(str::to_owned);
        let url = url.map(str::to_owned);

        let produced = tokio::task::spawn_blocking(move || {
            service.produce(width.as_deref(), height.as_deref(), url.as_deref(), mode)
        })
        .await
        .map_err(|e| ThumbnailError::Worker(e.to_string()))??;

        match produced {
            Produced::Hit { data, modified } => Ok(ThumbnailResponse {
                data,
                cache_hit: true,
                last_modified: modified,
                mode,
                pending_write: None,
            }),
            Produced::Miss { data, cache_path } => {
                let pending_write = self.spawn_persist(cache_path, data.clone());
                Ok(ThumbnailResponse {
                    data,
                    cache_hit: false,
                    last_modified: SystemTime::now(),
                    mode,
                    pending_write: Some(pending_write),
                })
            }
        }
    }

    /// Blocking part of [`get_thumbnail`](Self::get_thumbnail).
    fn produce(
        &self,
        width: Option<&str>,
        height: Option<&str>,
        url: Option<&str>,
        mode: FitMode,
    ) -> Result<Produced, ThumbnailError> {
        let request = self.validator.validate(width, height, url, mode)?;
        let cache_path = self.cache_path(&request);

        if let Some(cached) = self.store.try_serve_cached(&cache_path)? {
            debug!(
                source = %request.relative_path().display(),
                width = request.width(),
                height = request.height(),
                mode = %mode,
                "Thumbnail cache hit"
            );
            return Ok(Produced::Hit {
                data: cached.data,
                modified: cached.modified,
            });
        }

        debug!(
            source = %request.relative_path().display(),
            width = request.width(),
            height = request.height(),
            mode = %mode,
            "Thumbnail cache miss, generating"
        );
        let image = self.render(&request)?;
        let data = encode_jpeg(&image, self.quality)?;

        Ok(Produced::Miss { data, cache_path })
    }

    fn spawn_persist(
        &self,
        cache_path: PathBuf,
        data: Bytes,
    ) -> JoinHandle<Result<PersistOutcome, ThumbnailError>> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let result = store.persist_encoded(&cache_path, &data);
            if let Err(ref e) = result {
                error!(
                    path = %cache_path.display(),
                    error = %e,
                    "Failed to persist thumbnail"
                );
            }
            result
        })
    }

    /// Root of the cache directory.
    pub fn cache_root(&self) -> &Path {
        self.store.root()
    }
}

// =============================================================================
// Tests
// =============================================================================
