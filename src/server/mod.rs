//! HTTP server layer for the thumbnail server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │         GET /d | /c | /lw ?w={w}&h={h}&url={path}               │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │         handlers         │  │           routes            │  │
//! │  │ (query → service → JPEG) │  │ (router, CORS, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    crop_handler, fallback_handler, health_handler, http_date, pad_handler, status_for,
    stretch_handler, AppState, ErrorResponse, HealthResponse, ThumbnailQueryParams,
    CACHE_HIT_HEADER, DEFAULT_EXPIRES_DAYS, MODE_HEADER,
};
pub use routes::{create_router, route_path, RouterConfig};
