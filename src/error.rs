use thiserror::Error;

/// Coarse classification of a [`ThumbnailError`].
///
/// The HTTP layer maps each kind to one status code; nothing in the core
/// retries on any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request: bad dimensions, non-relative path, unsupported extension
    InvalidArgument,

    /// The resolved source file does not exist
    NotFound,

    /// The source file exists but is not a decodable image
    DecodeFailure,

    /// Directory creation, temp-file write, rename or read failed
    IoFailure,
}

/// Errors produced while validating, rendering or caching a thumbnail.
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    /// Query string could not be parsed (e.g. a repeated parameter)
    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },

    /// Width or height missing, unparsable, zero/negative or above the limit
    #[error("Invalid {parameter}: {message}")]
    InvalidDimension {
        parameter: &'static str,
        message: String,
    },

    /// Source path is missing, absolute, or escapes the application root
    #[error("Invalid source path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Source extension is not in the allow-list
    #[error("Unsupported source extension '{extension}' (supported: {supported})")]
    UnsupportedExtension { extension: String, supported: String },

    /// Source file does not exist or is not a regular file
    #[error("Source image not found: {path}")]
    SourceNotFound { path: String },

    /// Source file could not be decoded as an image
    #[error("Failed to decode source image {path}: {message}")]
    Decode { path: String, message: String },

    /// Output image could not be encoded
    #[error("Failed to encode thumbnail: {message}")]
    Encode { message: String },

    /// Filesystem operation failed
    #[error("I/O error during {operation} on {path}: {message}")]
    Io {
        operation: &'static str,
        path: String,
        message: String,
    },

    /// A blocking worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl ThumbnailError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThumbnailError::InvalidQuery { .. }
            | ThumbnailError::InvalidDimension { .. }
            | ThumbnailError::InvalidPath { .. }
            | ThumbnailError::UnsupportedExtension { .. } => ErrorKind::InvalidArgument,
            ThumbnailError::SourceNotFound { .. } => ErrorKind::NotFound,
            ThumbnailError::Decode { .. } => ErrorKind::DecodeFailure,
            ThumbnailError::Encode { .. }
            | ThumbnailError::Io { .. }
            | ThumbnailError::Worker(_) => ErrorKind::IoFailure,
        }
    }

    /// Build an I/O error for `operation` on `path`.
    pub(crate) fn io(
        operation: &'static str,
        path: &std::path::Path,
        err: &std::io::Error,
    ) -> Self {
        ThumbnailError::Io {
            operation,
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
