//! Router configuration for the thumbnail server.
//!
//! This module defines the HTTP routes and applies CORS and tracing middleware.
//!
//! # Route Structure
//!
//! ```text
//! /health                 - Health check
//! /d?w=&h=&url=           - Stretch thumbnail
//! /c?w=&h=&url=           - Crop thumbnail
//! /lw?w=&h=&url=          - Pad thumbnail
//! *                       - JSON 404
//! ```
//!
//! # Example
//!
//! ```ignore
//! use thumbnail_server::server::routes::{create_router, RouterConfig};
//! use thumbnail_server::thumbnail::{ThumbnailConfig, ThumbnailService};
//!
//! let service = ThumbnailService::new(ThumbnailConfig::new("/srv/www", "/srv/www/PreImgTemp"));
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    crop_handler, fallback_handler, health_handler, pad_handler, stretch_handler, AppState,
    DEFAULT_EXPIRES_DAYS,
};
use crate::thumbnail::{FitMode, ThumbnailService};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Days until a served thumbnail expires
    pub expires_days: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Thumbnails expire after 7 days
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            expires_days: DEFAULT_EXPIRES_DAYS,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the expiry in days.
    pub fn with_expires_days(mut self, days: u32) -> Self {
        self.expires_days = days;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Route path for a fit mode, e.g. `/c` for [`FitMode::Crop`].
pub fn route_path(mode: FitMode) -> String {
    format!("/{}", mode.route())
}

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - One thumbnail route per fit mode
/// - Health check and JSON 404 fallback
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router(service: ThumbnailService, config: RouterConfig) -> Router {
    let app_state = AppState::with_expires_days(service, config.expires_days);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(&route_path(FitMode::Stretch), get(stretch_handler))
        .route(&route_path(FitMode::Crop), get(crop_handler))
        .route(&route_path(FitMode::Pad), get(pad_handler))
        .fallback(fallback_handler)
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
