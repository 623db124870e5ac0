use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// @module: Upload, workspace and download file handling

/// Container extensions accepted as uploads
const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
    "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// Stateless helpers over std::fs with contextual errors
pub struct FileManager;

impl FileManager {
    // @checks: Regular file, not a directory
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: `path` and its parents; existing directories are fine
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        fs::create_dir_all(path)
            .with_context(|| format!("Could not create directory {}", path.display()))
    }

    /// Copy `from` to `to`, creating the destination directory first
    ///
    /// Returns the number of bytes written.
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<u64> {
        let (from, to) = (from.as_ref(), to.as_ref());

        if !from.is_file() {
            return Err(anyhow!("Source file does not exist: {}", from.display()));
        }
        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::ensure_dir(parent)?;
        }

        let bytes = fs::copy(from, to)
            .with_context(|| format!("Could not copy {} to {}", from.display(), to.display()))?;
        debug!("Copied {} bytes to {}", bytes, to.display());
        Ok(bytes)
    }

    /// Delete the regular files directly inside `dir`, returning how many were removed
    ///
    /// Subdirectories are left alone. Files that cannot be removed are skipped.
    pub fn cleanup_dir<P: AsRef<Path>>(dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("Could not list {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => debug!("Could not remove {:?}: {}", entry.path(), e),
            }
        }

        Ok(removed)
    }

    /// Size of the file at `path` in bytes
    pub fn file_size<P: AsRef<Path>>(path: P) -> Result<u64> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .with_context(|| format!("Could not read metadata for {}", path.display()))?;
        Ok(metadata.len())
    }

    /// Whether `path` has a known video file extension
    pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                VIDEO_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}
