//! Front controller integration tests.
//!
//! The router is driven with `oneshot`, no port is bound. Handler scripts
//! are never executed here: a recording invoker stands in for php-cgi and
//! answers with a fixed JSON body.
//!
//! Covered paths:
//!   - GET /api/auth/session.php        (handler invoked, body passed through)
//!   - GET /api/auth/session            (default extension appended)
//!   - GET /api/totally/missing         (404 JSON envelope)
//!   - GET /uploads/avatars/1.png       (MIME + exact Content-Length)
//!   - GET /uploads/logo.png            (missing upload falls through)
//!   - GET /dashboard                   (SPA shell)
//!   - GET /app.js                      (deferred to static file service)

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt; // for .collect()
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt; // for .oneshot()

use fitai::config::Config;
use fitai::error::AppResult;
use fitai::gateway::cgi::{HandlerInvoker, HandlerRequest};
use fitai::gateway::resolve::{resolve, RequestContext, Resolution};
use fitai::gateway::{build_app, AppState};

const SHELL_HTML: &str = "<!doctype html><html><body><div id=\"app\"></div></body></html>";

// ── fixtures ──────────────────────────────────────────────────────────────────

/// Records every handler invocation and answers with a fixed JSON body.
#[derive(Default)]
struct RecordingInvoker {
    calls: Mutex<Vec<HandlerRequest>>,
}

impl RecordingInvoker {
    fn calls(&self) -> Vec<HandlerRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HandlerInvoker for RecordingInvoker {
    async fn invoke(&self, request: HandlerRequest) -> AppResult<Response> {
        let script_name = request.script.script_name.clone();
        self.calls.lock().unwrap().push(request);
        Ok((
            StatusCode::OK,
            axum::Json(json!({ "success": true, "script": script_name })),
        )
            .into_response())
    }
}

/// Temp directory laid out like a deployment: public/, uploads/, api/.
struct Site {
    _dir: TempDir,
    config: Config,
}

fn site() -> Site {
    let dir = tempfile::tempdir().expect("tempdir");
    let public = dir.path().join("public");
    let uploads = dir.path().join("uploads");
    let api = dir.path().join("api");

    std::fs::create_dir_all(public.join("css")).unwrap();
    std::fs::create_dir_all(uploads.join("avatars")).unwrap();
    std::fs::create_dir_all(uploads.join("music")).unwrap();
    std::fs::create_dir_all(api.join("auth")).unwrap();

    std::fs::write(public.join("index.html"), SHELL_HTML).unwrap();
    std::fs::write(public.join("app.js"), "console.log('fitai');").unwrap();
    std::fs::write(public.join("css").join("main.css"), "body{margin:0}").unwrap();
    std::fs::write(uploads.join("avatars").join("1.png"), vec![0x89u8; 2048]).unwrap();
    std::fs::write(uploads.join("music").join("track.MP3"), vec![1u8; 512]).unwrap();
    std::fs::write(api.join("auth").join("session.php"), "<?php echo '{}';").unwrap();
    std::fs::write(api.join("plans.php"), "<?php").unwrap();

    let mut config = Config::default();
    config.paths.public_root = public;
    config.paths.uploads_root = uploads;
    config.paths.api_root = api;

    Site { _dir: dir, config }
}

fn app(config: Config) -> (axum::Router, Arc<RecordingInvoker>) {
    let invoker = Arc::new(RecordingInvoker::default());
    let state = Arc::new(AppState::new(config, invoker.clone()));
    let cors = tower_http::cors::CorsLayer::new();
    (build_app(state, cors), invoker)
}

async fn get(app: axum::Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("response is JSON")
}

fn header_str<'a>(resp: &'a Response, name: header::HeaderName) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// ── /health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let site = site();
    let (app, _) = app(site.config.clone());

    let resp = get(app, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

// ── API handlers ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_existing_handler_is_invoked() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let resp = get(app, "/api/auth/session.php").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["script"], "/api/auth/session.php");

    let calls = invoker.calls();
    assert_eq!(calls.len(), 1, "handler runs exactly once");
    assert!(calls[0].script.path.ends_with("auth/session.php"));
}

#[tokio::test]
async fn test_default_extension_is_appended() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let resp = get(app, "/api/plans?week_start=2026-10-12").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = invoker.calls();
    assert_eq!(calls[0].script.script_name, "/api/plans.php");
    assert_eq!(calls[0].uri.query(), Some("week_start=2026-10-12"));
}

#[tokio::test]
async fn test_handler_receives_method_headers_and_body() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/session.php")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-CSRF-Token", "tok-1")
        .body(Body::from(r#"{"csrf_token":"tok-1"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let call = &invoker.calls()[0];
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.headers.get("x-csrf-token").unwrap(), "tok-1");
    assert_eq!(&call.body[..], br#"{"csrf_token":"tok-1"}"#);
}

#[tokio::test]
async fn test_missing_handler_returns_json_envelope() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let resp = get(app, "/api/totally/missing").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(header_str(&resp, header::CONTENT_TYPE).starts_with("application/json"));
    assert_eq!(
        body_json(resp).await,
        json!({ "error": true, "message": "Endpoint not found: /api/totally/missing" })
    );
    assert!(invoker.calls().is_empty());
}

#[tokio::test]
async fn test_directory_is_not_a_handler() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let resp = get(app, "/api/auth").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(invoker.calls().is_empty());
}

#[tokio::test]
async fn test_traversal_out_of_api_root_is_rejected() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let resp = get(app, "/api/../public/app.js").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(invoker.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let site = site();
    let mut config = site.config.clone();
    config.handlers.max_body_bytes = 16;
    let (app, invoker) = app(config);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/plans")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(resp).await["error"], true);
    assert!(invoker.calls().is_empty());
}

#[tokio::test]
async fn test_broken_request_body_is_bad_request() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"{\"message\":")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
    ];
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/plans")
        .body(Body::from_stream(futures::stream::iter(chunks)))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], true);
    assert!(invoker.calls().is_empty());
}

// ── uploads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_streamed_with_mime_and_length() {
    let site = site();
    let (app, _) = app(site.config.clone());

    let resp = get(app, "/uploads/avatars/1.png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "image/png");
    assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "2048");
    assert_eq!(header_str(&resp, header::ACCEPT_RANGES), "bytes");
    assert_eq!(body_bytes(resp).await, vec![0x89u8; 2048]);
}

#[tokio::test]
async fn test_upload_extension_is_case_insensitive() {
    let site = site();
    let (app, _) = app(site.config.clone());

    let resp = get(app, "/uploads/music/track.MP3").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "audio/mpeg");
    assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "512");
}

#[tokio::test]
async fn test_missing_upload_falls_through_to_shell() {
    let site = site();
    let (app, _) = app(site.config.clone());

    // nothing under public/ either, so the SPA shell answers
    let resp = get(app, "/uploads/avatars/404.png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, SHELL_HTML.as_bytes());
}

#[tokio::test]
async fn test_missing_upload_falls_through_to_public_asset() {
    let site = site();
    let public_uploads = site.config.paths.public_root.join("uploads");
    std::fs::create_dir_all(&public_uploads).unwrap();
    std::fs::write(public_uploads.join("logo.png"), b"PUBLICPNG").unwrap();
    let (app, _) = app(site.config.clone());

    let resp = get(app, "/uploads/logo.png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "image/png");
    assert_eq!(body_bytes(resp).await, b"PUBLICPNG");
}

#[tokio::test]
async fn test_missing_upload_is_404_when_fall_through_disabled() {
    let site = site();
    let mut config = site.config.clone();
    config.uploads.missing_falls_through = false;
    let (app, _) = app(config);

    let resp = get(app, "/uploads/avatars/404.png").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await, b"Not Found");
}

// ── static assets ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_static_asset_is_deferred() {
    let site = site();
    let state = AppState::new(site.config.clone(), Arc::new(RecordingInvoker::default()));

    let req = Request::builder().uri("/app.js").body(Body::empty()).unwrap();
    let mut ctx = RequestContext::new(req);
    let resolution = resolve(&state, &mut ctx).await.unwrap();

    match resolution {
        Resolution::Deferred(path) => assert!(path.ends_with("app.js")),
        other => panic!("expected Deferred, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deferred_asset_served_by_file_service() {
    let site = site();
    let (app, _) = app(site.config.clone());

    let resp = get(app, "/css/main.css").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header_str(&resp, header::CONTENT_TYPE).starts_with("text/css"));
    assert_eq!(body_bytes(resp).await, b"body{margin:0}");
}

#[tokio::test]
async fn test_missing_static_asset_gets_shell() {
    let site = site();
    let (app, _) = app(site.config.clone());

    let resp = get(app, "/missing.js").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, SHELL_HTML.as_bytes());
}

// ── SPA shell ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_client_route_gets_shell() {
    let site = site();
    let (app, invoker) = app(site.config.clone());

    let resp = get(app, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header_str(&resp, header::CONTENT_TYPE).starts_with("text/html"));
    assert_eq!(body_bytes(resp).await, SHELL_HTML.as_bytes());
    assert!(invoker.calls().is_empty());
}

#[tokio::test]
async fn test_missing_shell_is_plain_404() {
    let site = site();
    let mut config = site.config.clone();
    config.paths.index_file = "nope.html".to_string();
    let (app, _) = app(config);

    let resp = get(app, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(header_str(&resp, header::CONTENT_TYPE).starts_with("text/plain"));
}
