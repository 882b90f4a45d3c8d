use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extensions (lowercase, without the dot) that can be opened as images and hashed.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic",
];

/// Fail early when the input path is missing or is not a directory.
pub fn check_input_path(path: &Path) -> Result<(), ScanError> {
    if !path.exists() {
        return Err(ScanError::InvalidPath {
            path: path.to_string_lossy().to_string(),
        });
    }
    if !path.is_dir() {
        return Err(ScanError::NotADirectory {
            path: path.to_string_lossy().to_string(),
        });
    }
    Ok(())
}

/// List the regular files under `dir` as absolute paths, sorted by name within each directory.
///
/// Without `recursive` only the direct children of `dir` are returned.
/// Entries that cannot be read are logged and skipped.
pub fn get_filepaths(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    check_input_path(dir)?;
    let root = fs::canonicalize(dir)?;

    let mut walker = WalkDir::new(&root).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} files in {}", files.len(), root.display());
    Ok(files)
}

/// Keep the paths whose extension (case-insensitive) is one of `allowed`.
pub fn filter_filepaths(paths: Vec<PathBuf>, allowed: &[&str]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| has_extension(path, allowed))
        .collect()
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| *a == ext)
        })
        .unwrap_or(false)
}

/// Remove every empty directory below `root`, deepest first. `root` itself is kept.
pub fn remove_empty_folders(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    check_input_path(root)?;

    let mut removed = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if fs::read_dir(path)?.next().is_none() {
            fs::remove_dir(path)?;
            debug!("Removed empty folder {}", path.display());
            removed.push(path.to_path_buf());
        }
    }
    Ok(removed)
}
