use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::Path;

/// Serve the SPA shell document, or a plain-text 404 when it is missing.
pub async fn serve(index_path: &Path) -> Response {
    match tokio::fs::read(index_path).await {
        Ok(html) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], html).into_response(),
        Err(e) => {
            tracing::warn!("SPA shell {} unavailable: {}", index_path.display(), e);
            not_found()
        }
    }
}

pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
        .into_response()
}
