use std::path::{Path, PathBuf};

use super::paths::{extension_lowercase, join_under};

/// Extensions the host static file service is allowed to serve from the public root.
pub const STATIC_EXTENSIONS: [&str; 18] = [
    "css", "js", "png", "jpg", "jpeg", "gif", "ico", "svg", "woff", "woff2", "ttf", "webp", "wav",
    "webm", "ogg", "mp3", "mp4", "pdf",
];

pub fn is_static_extension(request_path: &str) -> bool {
    extension_lowercase(request_path).is_some_and(|ext| STATIC_EXTENSIONS.contains(&ext.as_str()))
}

/// Locate an allow-listed static asset under `public_root`.
pub async fn locate(public_root: &Path, request_path: &str) -> Option<PathBuf> {
    if !is_static_extension(request_path) {
        return None;
    }
    let file = join_under(public_root, request_path)?;
    match tokio::fs::metadata(&file).await {
        Ok(meta) if meta.is_file() => Some(file),
        _ => None,
    }
}
