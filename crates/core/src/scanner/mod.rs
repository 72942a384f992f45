pub mod hashing;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::AssetKind;
use crate::error::Result;

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "webp", "heic", "cr2", "cr3", "nef", "arw", "orf", "raf",
    "rw2", "dng",
];

const MOVIE_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "avi", "mts", "mkv"];

/// Whether `path` looks like a file of the given kind, judged by extension.
pub fn is_kind(path: &Path, kind: AssetKind) -> bool {
    let extensions = match kind {
        AssetKind::Photo => PHOTO_EXTENSIONS,
        AssetKind::Movie => MOVIE_EXTENSIONS,
    };
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Recursively collect files of `kind` under `dir`, sorted by path.
pub fn discover(dir: &Path, kind: AssetKind) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_kind(entry.path(), kind) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
