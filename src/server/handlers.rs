//! HTTP request handlers for the thumbnail API.
//!
//! This module contains the Axum handlers for serving thumbnails and health checks.
//!
//! # Endpoints
//!
//! - `GET /d?w=&h=&url=` - Stretch thumbnail
//! - `GET /c?w=&h=&url=` - Crop thumbnail
//! - `GET /lw?w=&h=&url=` - Pad (letterbox) thumbnail
//! - `GET /health` - Health check endpoint

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderName, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{ErrorKind, ThumbnailError};
use crate::thumbnail::{FitMode, ThumbnailService};

/// Default HTTP expiry in days.
pub const DEFAULT_EXPIRES_DAYS: u32 = 7;

const SECONDS_PER_DAY: u64 = 86_400;

/// Response header reporting whether the thumbnail came from the disk cache.
pub const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-thumbnail-cache-hit");

/// Response header reporting the fit mode used.
pub const MODE_HEADER: HeaderName = HeaderName::from_static("x-thumbnail-mode");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the thumbnail service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The thumbnail service for processing requests
    pub service: Arc<ThumbnailService>,

    /// How long clients may cache a thumbnail, in days
    pub expires_days: u32,
}

impl AppState {
    /// Create a new application state with the default expiry.
    pub fn new(service: ThumbnailService) -> Self {
        Self::with_expires_days(service, DEFAULT_EXPIRES_DAYS)
    }

    /// Create a new application state with a custom expiry.
    pub fn with_expires_days(service: ThumbnailService, expires_days: u32) -> Self {
        Self {
            service: Arc::new(service),
            expires_days,
        }
    }

    /// Expiry as a duration.
    pub fn expires_in(&self) -> Duration {
        Duration::from_secs(u64::from(self.expires_days) * SECONDS_PER_DAY)
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters shared by all thumbnail routes.
///
/// Everything is taken as raw text; parsing and range checks happen in the
/// validator so that every malformed value maps to the same 400 response.
#[derive(Debug, Default, Deserialize)]
pub struct ThumbnailQueryParams {
    /// Target width in pixels
    #[serde(default)]
    pub w: Option<String>,

    /// Target height in pixels
    #[serde(default)]
    pub h: Option<String>,

    /// Source image path relative to the application root
    #[serde(default)]
    pub url: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_argument")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Status code and error identifier for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::InvalidArgument => (StatusCode::BAD_REQUEST, "invalid_argument"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        ErrorKind::DecodeFailure => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "decode_failure"),
        ErrorKind::IoFailure => (StatusCode::INTERNAL_SERVER_ERROR, "io_failure"),
    }
}

/// Convert ThumbnailError to HTTP response.
///
/// This implementation logs errors appropriately based on their severity:
/// - 4xx errors are logged at WARN level (404 at DEBUG)
/// - 5xx errors are logged at ERROR level
impl IntoResponse for ThumbnailError {
    fn into_response(self) -> Response {
        let (status, error_type) = status_for(self.kind());
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle stretch thumbnail requests.
///
/// # Endpoint
///
/// `GET /d?w={width}&h={height}&url={path}`
///
/// The source is scaled to exactly `w`×`h`, ignoring its aspect ratio.
pub async fn stretch_handler(
    State(state): State<AppState>,
    query: Result<Query<ThumbnailQueryParams>, QueryRejection>,
) -> Result<Response, ThumbnailError> {
    serve_thumbnail(&state, query_params(query)?, FitMode::Stretch).await
}

/// Handle crop thumbnail requests.
///
/// # Endpoint
///
/// `GET /c?w={width}&h={height}&url={path}`
///
/// The largest centered region with the target aspect ratio is cut from the
/// source and scaled to `w`×`h`.
pub async fn crop_handler(
    State(state): State<AppState>,
    query: Result<Query<ThumbnailQueryParams>, QueryRejection>,
) -> Result<Response, ThumbnailError> {
    serve_thumbnail(&state, query_params(query)?, FitMode::Crop).await
}

/// Handle pad (letterbox) thumbnail requests.
///
/// # Endpoint
///
/// `GET /lw?w={width}&h={height}&url={path}`
///
/// The whole source is scaled to fit inside `w`×`h` and centered on the
/// background color.
pub async fn pad_handler(
    State(state): State<AppState>,
    query: Result<Query<ThumbnailQueryParams>, QueryRejection>,
) -> Result<Response, ThumbnailError> {
    serve_thumbnail(&state, query_params(query)?, FitMode::Pad).await
}

/// Unwrap the query extractor, turning a malformed query string into a
/// JSON-bodied 400 like every other invalid argument.
fn query_params(
    query: Result<Query<ThumbnailQueryParams>, QueryRejection>,
) -> Result<ThumbnailQueryParams, ThumbnailError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ThumbnailError::InvalidQuery {
            message: rejection.body_text(),
        })
}

/// Shared body of the thumbnail handlers.
///
/// # Response
///
/// - `200 OK`: JPEG thumbnail
/// - `400 Bad Request`: invalid `w`, `h` or `url`
/// - `404 Not Found`: source image does not exist
/// - `415 Unsupported Media Type`: source is not a decodable image
/// - `500 Internal Server Error`: cache I/O or encoding failure
///
/// # Headers
///
/// - `Content-Type: image/jpeg`
/// - `Cache-Control: public, max-age={expires}`
/// - `Expires`, `Last-Modified`
/// - `X-Thumbnail-Cache-Hit: true|false`
/// - `X-Thumbnail-Mode: Stretch|Crop|Pad`
async fn serve_thumbnail(
    state: &AppState,
    query: ThumbnailQueryParams,
    mode: FitMode,
) -> Result<Response, ThumbnailError> {
    // A pending cache write is detached when the response is dropped here.
    let response = state
        .service
        .get_thumbnail(
            query.w.as_deref(),
            query.h.as_deref(),
            query.url.as_deref(),
            mode,
        )
        .await?;

    let expires_in = state.expires_in();
    let headers = [
        (header::CONTENT_TYPE, "image/jpeg".to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", expires_in.as_secs()),
        ),
        (header::EXPIRES, http_date(SystemTime::now() + expires_in)),
        (header::LAST_MODIFIED, http_date(response.last_modified)),
        (CACHE_HIT_HEADER, response.cache_hit.to_string()),
        (MODE_HEADER, response.mode.name().to_string()),
    ];

    Ok((StatusCode::OK, headers, response.data).into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle requests for any other path with a JSON 404.
pub async fn fallback_handler(uri: Uri) -> Response {
    debug!(path = %uri.path(), "Unknown route");

    let status = StatusCode::NOT_FOUND;
    let error_response = ErrorResponse::with_status(
        "unknown_route",
        format!("No route for {}", uri.path()),
        status,
    );

    (status, Json(error_response)).into_response()
}

/// Format a timestamp as an RFC 7231 HTTP date.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

// =============================================================================
// Tests
// =============================================================================
