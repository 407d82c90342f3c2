//! Cache path derivation.

use std::path::{Path, PathBuf};

use super::request::FitMode;

/// Extension of every cached thumbnail.
pub const CACHE_FILE_EXTENSION: &str = "jpg";

/// Build the cache file path for a thumbnail.
///
/// The result is `{cache_root}/{relative_source}_{width}_{height}_{ModeName}.jpg`.
/// It is a pure function of its inputs and never touches the filesystem, so
/// the same request maps to the same file across processes and restarts.
pub fn cache_path(
    cache_root: &Path,
    relative_source: &Path,
    width: u32,
    height: u32,
    mode: FitMode,
) -> PathBuf {
    let mut file = relative_source.as_os_str().to_os_string();
    file.push(format!(
        "_{}_{}_{}.{}",
        width,
        height,
        mode.name(),
        CACHE_FILE_EXTENSION
    ));
    cache_root.join(file)
}
