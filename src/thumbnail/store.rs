//! Disk-backed thumbnail cache.
//!
//! The filesystem is the only index: a thumbnail is cached if and only if its
//! file exists at the path derived by [`cache_path`](super::path::cache_path).
//! Nothing is ever evicted.
//!
//! # Atomic Writes
//!
//! New entries are written to a uniquely named temporary file in the target
//! directory and then renamed into place, so readers only ever see a complete
//! file. Several requests regenerating the same key at once each write their
//! own temp file; whichever rename lands last wins, and since identical inputs
//! give identical bytes the result is the same either way.
//!
//! Temp files are named `{final_name}_{yyyyMMddHHmmssffffff}_{token}.temp` and
//! are removed on every exit path by a drop guard. A crash between writing and
//! renaming can still leave one behind; those are not swept.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use image::RgbImage;
use tracing::{debug, warn};

use crate::error::ThumbnailError;

use super::codec::encode_jpeg_to;

/// Extension of in-flight temporary files.
pub const TEMP_FILE_EXTENSION: &str = "temp";

/// A thumbnail read back from the cache.
#[derive(Debug, Clone)]
pub struct CachedThumbnail {
    /// Raw JPEG bytes as stored on disk
    pub data: Bytes,

    /// Modification time of the cache file (when it was generated)
    pub modified: SystemTime,
}

/// Result of a persistence attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The file was written and renamed into place
    Written,

    /// A complete file already existed, nothing was written
    AlreadyCached,

    /// The generated temp name was taken; the write was skipped
    TempCollision,
}

// =============================================================================
// Cache Store
// =============================================================================

/// Add-only thumbnail store rooted at a cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the cached thumbnail at `path`, or `None` on a miss.
    ///
    /// The bytes are returned as stored; nothing is decoded. A file that
    /// disappears between lookup and read is reported as a miss.
    pub fn try_serve_cached(&self, path: &Path) -> Result<Option<CachedThumbnail>, ThumbnailError> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            // A non-directory ancestor also means there is no entry.
            Err(_) if !path.is_file() => return Ok(None),
            Err(e) => return Err(ThumbnailError::io("open cached thumbnail", path, &e)),
        };

        let metadata = file
            .metadata()
            .map_err(|e| ThumbnailError::io("stat cached thumbnail", path, &e))?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let mut data = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| ThumbnailError::io("read cached thumbnail", path, &e))?;

        Ok(Some(CachedThumbnail {
            data: Bytes::from(data),
            modified: metadata.modified().unwrap_or_else(|_| SystemTime::now()),
        }))
    }

    /// Encode `image` as JPEG at `quality` and persist it atomically at `path`.
    pub fn persist_generated(
        &self,
        path: &Path,
        image: &RgbImage,
        quality: u8,
    ) -> Result<PersistOutcome, ThumbnailError> {
        self.write_atomic(path, |writer| encode_jpeg_to(writer, image, quality))
    }

    /// Persist already-encoded JPEG bytes atomically at `path`.
    pub fn persist_encoded(&self, path: &Path, data: &[u8]) -> Result<PersistOutcome, ThumbnailError> {
        self.write_atomic(path, |writer| {
            writer
                .write_all(data)
                .map_err(|e| ThumbnailError::io("write temp file", path, &e))
        })
    }

    fn write_atomic<F>(&self, path: &Path, write: F) -> Result<PersistOutcome, ThumbnailError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), ThumbnailError>,
    {
        let parent = path.parent().ok_or_else(|| ThumbnailError::Io {
            operation: "resolve cache directory",
            path: path.display().to_string(),
            message: "cache path has no parent directory".to_string(),
        })?;
        fs::create_dir_all(parent)
            .map_err(|e| ThumbnailError::io("create cache directory", parent, &e))?;

        if path.is_file() {
            debug!(path = %path.display(), "Thumbnail already cached, skipping write");
            return Ok(PersistOutcome::AlreadyCached);
        }

        let temp_path = temp_path_for(path);
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %temp_path.display(), "Temp file name already taken, skipping write");
                return Ok(PersistOutcome::TempCollision);
            }
            Err(e) => return Err(ThumbnailError::io("create temp file", &temp_path, &e)),
        };
        let _guard = TempFileGuard::new(&temp_path);

        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| ThumbnailError::io("flush temp file", &temp_path, e.error()))?;
        file.sync_all()
            .map_err(|e| ThumbnailError::io("sync temp file", &temp_path, &e))?;
        drop(file);

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ThumbnailError::io("remove previous thumbnail", path, &e)),
        }
        fs::rename(&temp_path, path)
            .map_err(|e| ThumbnailError::io("rename temp file", path, &e))?;

        debug!(path = %path.display(), "Persisted thumbnail");
        Ok(PersistOutcome::Written)
    }
}

/// Unique temp file path next to `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%6f");
    let token = uuid::Uuid::new_v4().simple();

    let mut name = path.as_os_str().to_os_string();
    name.push(format!("_{}_{}.{}", stamp, token, TEMP_FILE_EXTENSION));
    PathBuf::from(name)
}

/// Removes a temp file when dropped, tolerating "not found".
struct TempFileGuard<'a> {
    path: &'a Path,
}

impl<'a> TempFileGuard<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path }
    }
}

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove temporary thumbnail file"
                );
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
