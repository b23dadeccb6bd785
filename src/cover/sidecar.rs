//! Detect sidecar cover art files in the same directory as audio files.
//!
//! Import registers the first match as the album's art file.
//!
//! Common sidecar filenames:
//! - cover.jpg, cover.png
//! - folder.jpg, folder.png
//! - album.jpg, album.png
//! - front.jpg, front.png

use std::path::{Path, PathBuf};

/// Common cover art filenames (lowercase for matching)
const COVER_FILENAMES: &[&str] = &[
    "cover",
    "folder",
    "album",
    "front",
    "artwork",
    "albumart",
    "albumartsmall",
];

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Find a sidecar cover art file next to `audio_path`.
pub fn find_sidecar_cover(audio_path: &Path) -> Option<PathBuf> {
    let parent = audio_path.parent()?;

    for name in COVER_FILENAMES {
        for ext in IMAGE_EXTENSIONS {
            let cover_path = parent.join(format!("{}.{}", name, ext));
            if cover_path.is_file() {
                return Some(cover_path);
            }
        }
    }

    // Case variations on case-sensitive filesystems
    std::fs::read_dir(parent)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .find(|p| is_cover_name(p))
}

fn is_cover_name(path: &Path) -> bool {
    let lower = |s: Option<&std::ffi::OsStr>| s.and_then(|s| s.to_str()).map(str::to_lowercase);
    match (lower(path.file_stem()), lower(path.extension())) {
        (Some(stem), Some(ext)) => {
            COVER_FILENAMES.contains(&stem.as_str()) && IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
