use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use super::resolve;
use super::AppState;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // API handlers, uploads, static assets and the SPA shell
        .fallback(resolve::dispatch)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
