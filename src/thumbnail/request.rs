//! Request validation.
//!
//! Every raw request parameter passes through [`RequestValidator`] before any
//! image work happens. The validator is also the path-traversal defense: a
//! source path must be relative, must stay under the application root after
//! lexical normalization, and must still be under the root once symlinks are
//! resolved.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ThumbnailError;

use super::path::cache_path;

/// Source extensions accepted by default (compared case-insensitively).
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] =
    &["bmp", "gif", "jpg", "jpeg", "png", "tiff", "exif"];

/// Default upper bound for a requested width or height.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

// =============================================================================
// Fit Mode
// =============================================================================

/// Policy for mapping a source image into the target rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum FitMode {
    /// Scale each axis independently; aspect ratio is not preserved.
    #[default]
    Stretch,

    /// Keep the aspect ratio and cut away what does not fit, centered.
    Crop,

    /// Keep the aspect ratio and letterbox with the background color.
    Pad,
}

impl FitMode {
    /// All modes, in route registration order.
    pub const ALL: [FitMode; 3] = [FitMode::Stretch, FitMode::Crop, FitMode::Pad];

    /// Name used in cache file names. Changing these orphans existing caches.
    pub fn name(self) -> &'static str {
        match self {
            FitMode::Stretch => "Stretch",
            FitMode::Crop => "Crop",
            FitMode::Pad => "Pad",
        }
    }

    /// Path segment of the HTTP route serving this mode.
    pub fn route(self) -> &'static str {
        match self {
            FitMode::Stretch => "d",
            FitMode::Crop => "c",
            FitMode::Pad => "lw",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Thumbnail Request
// =============================================================================

/// A validated thumbnail request.
///
/// Only [`RequestValidator::validate`] creates these, so holding one means the
/// dimensions are positive and the source is an existing, allow-listed file
/// under the application root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    source_path: PathBuf,
    relative_path: PathBuf,
    width: u32,
    height: u32,
    mode: FitMode,
}

impl ThumbnailRequest {
    /// Canonical absolute path of the source image.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Normalized source path relative to the application root.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> FitMode {
        self.mode
    }

    /// Cache file location for this request under `cache_root`.
    pub fn cache_path(&self, cache_root: &Path) -> PathBuf {
        cache_path(
            cache_root,
            &self.relative_path,
            self.width,
            self.height,
            self.mode,
        )
    }
}

// =============================================================================
// Request Validator
// =============================================================================

/// Parses and validates raw request parameters.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    app_root: PathBuf,
    allowed_extensions: Vec<String>,
    max_dimension: u32,
}

impl RequestValidator {
    /// Create a validator rooted at `app_root` with the default allow-list.
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Replace the extension allow-list.
    ///
    /// Entries are normalized: surrounding whitespace and a leading dot are
    /// dropped and the result is lowercased, so `".JPG"` and `"jpg"` match.
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Set the largest accepted width or height.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Validate raw `w`, `h` and `url` parameters for the given mode.
    ///
    /// Checks run cheapest first: dimensions, then the lexical shape of the
    /// path and its extension, and only then the filesystem.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailError::InvalidDimension`] for bad `w`/`h`
    /// - [`ThumbnailError::InvalidPath`] for missing, absolute or escaping paths
    /// - [`ThumbnailError::UnsupportedExtension`] for extensions outside the allow-list
    /// - [`ThumbnailError::SourceNotFound`] when the file does not exist
    pub fn validate(
        &self,
        width: Option<&str>,
        height: Option<&str>,
        url: Option<&str>,
        mode: FitMode,
    ) -> Result<ThumbnailRequest, ThumbnailError> {
        let width = self.parse_dimension("w", width)?;
        let height = self.parse_dimension("h", height)?;
        let relative_path = normalize_relative_path(url)?;
        self.check_extension(&relative_path)?;
        let source_path = self.resolve(&relative_path)?;

        Ok(ThumbnailRequest {
            source_path,
            relative_path,
            width,
            height,
            mode,
        })
    }

    fn parse_dimension(
        &self,
        parameter: &'static str,
        raw: Option<&str>,
    ) -> Result<u32, ThumbnailError> {
        let invalid = |message: String| ThumbnailError::InvalidDimension { parameter, message };

        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("parameter is required".to_string()))?;

        let value: i64 = raw
            .parse()
            .map_err(|_| invalid(format!("'{}' is not an integer", raw)))?;

        if value <= 0 {
            return Err(invalid(format!("{} must be greater than 0", value)));
        }
        if value > i64::from(self.max_dimension) {
            return Err(invalid(format!(
                "{} exceeds the maximum of {}",
                value, self.max_dimension
            )));
        }

        Ok(value as u32)
    }

    fn check_extension(&self, relative_path: &Path) -> Result<(), ThumbnailError> {
        let extension = relative_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if !extension.is_empty() && self.allowed_extensions.contains(&extension) {
            Ok(())
        } else {
            Err(ThumbnailError::UnsupportedExtension {
                extension,
                supported: self.allowed_extensions.join(","),
            })
        }
    }

    fn resolve(&self, relative_path: &Path) -> Result<PathBuf, ThumbnailError> {
        let candidate = self.app_root.join(relative_path);
        let not_found = || ThumbnailError::SourceNotFound {
            path: relative_path.display().to_string(),
        };

        let metadata = match fs::metadata(&candidate) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(ThumbnailError::io("stat source image", &candidate, &e)),
        };
        if !metadata.is_file() {
            return Err(not_found());
        }

        let root = self
            .app_root
            .canonicalize()
            .map_err(|e| ThumbnailError::io("resolve application root", &self.app_root, &e))?;
        let canonical = candidate
            .canonicalize()
            .map_err(|e| ThumbnailError::io("resolve source image", &candidate, &e))?;

        if !canonical.starts_with(&root) {
            return Err(ThumbnailError::InvalidPath {
                path: relative_path.display().to_string(),
                reason: "resolves outside the application root".to_string(),
            });
        }

        Ok(canonical)
    }
}

// =============================================================================
// Path Normalization
// =============================================================================

/// Decode and lexically normalize a raw `url` parameter.
///
/// The value is percent-decoded once more on top of the query-string decoding
/// already done by the HTTP layer. A leading `~/` refers to the application
/// root. Both `/` and `\` separate segments; `.` segments are dropped and
/// `..` pops a segment, failing if there is nothing left to pop.
pub fn normalize_relative_path(raw: Option<&str>) -> Result<PathBuf, ThumbnailError> {
    let invalid = |path: &str, reason: &str| ThumbnailError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("", "url parameter is required"))?;

    let decoded = urlencoding::decode(raw)
        .map_err(|_| invalid(raw, "not valid UTF-8 after percent-decoding"))?;
    let decoded = decoded.trim();

    if url::Url::parse(decoded).is_ok() {
        return Err(invalid(decoded, "must be a relative path, not an absolute URL"));
    }

    let path = decoded.strip_prefix("~/").unwrap_or(decoded);
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(invalid(decoded, "must be a relative path"));
    }

    let mut normalized = PathBuf::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if !normalized.pop() {
                    return Err(invalid(decoded, "escapes the application root"));
                }
            }
            s if s.contains('\0') => return Err(invalid(decoded, "contains a NUL byte")),
            s => normalized.push(s),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(invalid(decoded, "does not name a file"));
    }

    Ok(normalized)
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

// =============================================================================
// Tests
// =============================================================================
