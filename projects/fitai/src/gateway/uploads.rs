use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::paths::{extension_lowercase, join_under};
use crate::error::{AppError, AppResult};

pub const UPLOADS_PREFIX: &str = "/uploads/";

pub fn is_upload_path(path: &str) -> bool {
    path.starts_with(UPLOADS_PREFIX)
}

/// MIME type for an uploaded file extension (lower-case, no dot).
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "wav" => "audio/wav",
        "webm" => "audio/webm",
        "ogg" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Serve `/uploads/<relative>` from `uploads_root`.
///
/// Returns `Ok(None)` when no regular file exists at the resolved location.
/// Range requests are not fulfilled: the full body is always sent.
pub async fn serve(uploads_root: &Path, request_path: &str) -> AppResult<Option<Response>> {
    let Some(relative) = request_path.strip_prefix(UPLOADS_PREFIX) else {
        return Ok(None);
    };
    let Some(file) = join_under(uploads_root, relative) else {
        return Ok(None);
    };

    let Ok(handle) = File::open(&file).await else {
        return Ok(None);
    };
    // Length comes from the opened handle so it matches the streamed bytes.
    let meta = handle.metadata().await?;
    if !meta.is_file() {
        return Ok(None);
    }

    let mime = content_type_for(extension_lowercase(request_path).as_deref().unwrap_or(""));

    tracing::debug!("Serving upload {} ({} bytes, {})", file.display(), meta.len(), mime);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(mime))
        .header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"))
        .header(header::CONTENT_LENGTH, meta.len())
        .body(Body::from_stream(ReaderStream::new(handle)))
        .map(Some)
        .map_err(|e| AppError::Internal(e.to_string()))
}
