//! Configuration management for the thumbnail server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap, with `serve` and `render` subcommands
//! - Environment variables with `THUMB_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use thumbnail_server::config::{Cli, Command};
//!
//! // Parse from command line and environment
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Render(config) => println!("Rendering {}", config.source),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `THUMB_HOST` - Server bind address (default: 0.0.0.0)
//! - `THUMB_PORT` - Server port (default: 3000)
//! - `THUMB_APP_ROOT` - Directory source images are resolved against (default: .)
//! - `THUMB_CACHE_ROOT` - Thumbnail cache directory (default: {app_root}/PreImgTemp)
//! - `THUMB_QUALITY` - JPEG quality 0-100 (default: 75)
//! - `THUMB_BACKGROUND` - Pad color, `white`/`black`/`gray` or `#rrggbb` (default: white)
//! - `THUMB_EXTENSIONS` - Allowed source extensions, comma-separated
//! - `THUMB_MAX_DIMENSION` - Largest accepted width/height (default: 4096)
//! - `THUMB_EXPIRES_DAYS` - HTTP expiry in days (default: 7)
//! - `THUMB_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use image::Rgb;

pub use crate::server::DEFAULT_EXPIRES_DAYS;
use crate::thumbnail::{
    is_valid_quality, FitMode, ThumbnailConfig, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_DIMENSION,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default application root.
pub const DEFAULT_APP_ROOT: &str = ".";

/// Cache directory name under the application root when none is given.
pub const DEFAULT_CACHE_DIR: &str = "PreImgTemp";

/// Default pad color.
pub const DEFAULT_BACKGROUND_NAME: &str = "white";

/// Longest accepted HTTP expiry in days.
pub const MAX_EXPIRES_DAYS: u32 = 365;

fn default_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Thumbnail Server - on-demand image thumbnails with a disk cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "thumbnail-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP thumbnail server.
    Serve(ServeConfig),

    /// Render a single thumbnail to a file (and into the cache).
    Render(RenderConfig),
}

/// Settings shared by every subcommand that touches images or the cache.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory source image paths are resolved against.
    #[arg(long, default_value = DEFAULT_APP_ROOT, env = "THUMB_APP_ROOT")]
    pub app_root: PathBuf,

    /// Directory cached thumbnails are written under.
    ///
    /// Defaults to `PreImgTemp` inside the application root.
    #[arg(long, env = "THUMB_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// JPEG quality for generated thumbnails (0-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "THUMB_QUALITY")]
    pub quality: u8,

    /// Background color for padded thumbnails and transparent pixels.
    #[arg(long, default_value = DEFAULT_BACKGROUND_NAME, env = "THUMB_BACKGROUND")]
    pub background: String,

    /// Allowed source extensions (comma-separated, case-insensitive).
    #[arg(
        long,
        env = "THUMB_EXTENSIONS",
        value_delimiter = ',',
        default_values_t = default_extensions()
    )]
    pub extensions: Vec<String>,

    /// Largest accepted thumbnail width or height.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION, env = "THUMB_MAX_DIMENSION")]
    pub max_dimension: u32,
}

impl StoreArgs {
    /// Validate the settings and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_quality(self.quality) {
            return Err("quality must be between 0 and 100".to_string());
        }

        parse_color(&self.background)?;

        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err("at least one source extension must be allowed".to_string());
        }

        if self.max_dimension == 0 {
            return Err("max_dimension must be greater than 0".to_string());
        }

        if !self.app_root.is_dir() {
            return Err(format!(
                "app_root '{}' is not a directory",
                self.app_root.display()
            ));
        }

        Ok(())
    }

    /// Cache directory, falling back to `{app_root}/PreImgTemp`.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_root
            .clone()
            .unwrap_or_else(|| self.app_root.join(DEFAULT_CACHE_DIR))
    }

    /// Build the immutable service configuration.
    pub fn thumbnail_config(&self) -> Result<ThumbnailConfig, String> {
        let background = parse_color(&self.background)?;

        Ok(ThumbnailConfig::new(self.app_root.clone(), self.cache_root())
            .with_quality(self.quality)
            .with_background(background)
            .with_allowed_extensions(self.extensions.clone())
            .with_max_dimension(self.max_dimension))
    }
}

/// Configuration for the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "THUMB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "THUMB_PORT")]
    pub port: u16,

    // =========================================================================
    // Thumbnail Configuration
    // =========================================================================
    #[command(flatten)]
    pub store: StoreArgs,

    /// Days until a served thumbnail expires (sets `Expires` and `max-age`).
    #[arg(long, default_value_t = DEFAULT_EXPIRES_DAYS, env = "THUMB_EXPIRES_DAYS")]
    pub expires_days: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "THUMB_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()?;

        if self.expires_days > MAX_EXPIRES_DAYS {
            return Err(format!(
                "expires_days must be at most {}",
                MAX_EXPIRES_DAYS
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the `render` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RenderConfig {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Source image path, relative to the application root.
    #[arg(long)]
    pub source: String,

    /// Thumbnail width in pixels.
    #[arg(long)]
    pub width: String,

    /// Thumbnail height in pixels.
    #[arg(long)]
    pub height: String,

    /// Fit mode.
    #[arg(long, value_enum, default_value_t = FitMode::Stretch)]
    pub mode: FitMode,

    /// File to write the JPEG to.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RenderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()
    }
}

// =============================================================================
// Color Parsing
// =============================================================================

/// Parse a background color: `white`, `black`, `gray`, or `#rrggbb`/`rrggbb`.
pub fn parse_color(value: &str) -> Result<Rgb<u8>, String> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "white" => return Ok(Rgb([255, 255, 255])),
        "black" => return Ok(Rgb([0, 0, 0])),
        "gray" | "grey" => return Ok(Rgb([128, 128, 128])),
        _ => {}
    }

    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "invalid color '{}': expected white, black, gray or #rrggbb",
            value
        ));
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

// =============================================================================
// Tests
// =============================================================================
