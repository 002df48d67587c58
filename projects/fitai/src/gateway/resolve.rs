//! Ordered request resolution: API handler → upload asset → static asset → SPA shell.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::cgi::HandlerRequest;
use super::{assets, dispatch, shell, uploads, AppState};
use crate::error::{AppError, AppResult};

/// What a single strategy decided about a request.
#[derive(Debug)]
pub enum Outcome {
    /// The strategy produced the complete response.
    Handled(Response),
    /// The host static file service must serve this file; nothing was written.
    Deferred(PathBuf),
    /// Not this strategy's request; try the next one.
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ApiHandler,
    UploadAsset,
    StaticAsset,
}

/// Tried in order; whatever none of them takes gets the SPA shell.
pub const PIPELINE: [Strategy; 3] = [
    Strategy::ApiHandler,
    Strategy::UploadAsset,
    Strategy::StaticAsset,
];

/// Final decision for a request.
#[derive(Debug)]
pub enum Resolution {
    Handled(Response),
    /// Served by the host static file service.
    Deferred(PathBuf),
}

/// A request being walked through the pipeline. Only the API strategy
/// consumes the body.
pub struct RequestContext {
    pub path: String,
    pub parts: Parts,
    pub body: Option<Body>,
}

impl RequestContext {
    pub fn new(req: Request) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            path: parts.uri.path().to_string(),
            parts,
            body: Some(body),
        }
    }

    fn into_request(mut self) -> Request {
        let body = self.body.take().unwrap_or_else(Body::empty);
        Request::from_parts(self.parts, body)
    }
}

impl Strategy {
    pub async fn apply(self, state: &AppState, ctx: &mut RequestContext) -> AppResult<Outcome> {
        match self {
            Strategy::ApiHandler => api_handler(state, ctx).await,
            Strategy::UploadAsset => upload_asset(state, ctx).await,
            Strategy::StaticAsset => Ok(assets::locate(&state.config.paths.public_root, &ctx.path)
                .await
                .map_or(Outcome::Pass, Outcome::Deferred)),
        }
    }
}

/// Walk the pipeline until a strategy handles or defers the request,
/// falling back to the SPA shell.
pub async fn resolve(state: &AppState, ctx: &mut RequestContext) -> AppResult<Resolution> {
    for strategy in PIPELINE {
        let resolution = match strategy.apply(state, ctx).await? {
            Outcome::Pass => continue,
            Outcome::Handled(resp) => Resolution::Handled(resp),
            Outcome::Deferred(file) => Resolution::Deferred(file),
        };
        tracing::debug!("{} resolved by {:?}", ctx.path, strategy);
        return Ok(resolution);
    }
    Ok(Resolution::Handled(
        shell::serve(&state.config.paths.index_path()).await,
    ))
}

/// Router fallback: everything that is not an explicit route ends up here.
pub async fn dispatch(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let mut ctx = RequestContext::new(req);

    match resolve(&state, &mut ctx).await {
        Ok(Resolution::Handled(resp)) => resp,
        Ok(Resolution::Deferred(file)) => serve_deferred(file, ctx.into_request()).await,
        Err(e) => e.into_response(),
    }
}

async fn serve_deferred(file: PathBuf, req: Request) -> Response {
    match ServeFile::new(file).oneshot(req).await {
        Ok(resp) => resp.into_response(),
        Err(never) => match never {},
    }
}

async fn api_handler(state: &AppState, ctx: &mut RequestContext) -> AppResult<Outcome> {
    if !dispatch::is_api_path(&ctx.path) {
        return Ok(Outcome::Pass);
    }

    let handlers = &state.config.handlers;
    let Some(script) = dispatch::resolve_handler(
        &state.config.paths.api_root,
        &ctx.path,
        &handlers.default_extension,
    ) else {
        tracing::info!("No handler for {}", ctx.path);
        return Err(AppError::EndpointNotFound(ctx.path.clone()));
    };

    let body = ctx.body.take().unwrap_or_else(Body::empty);
    let body = axum::body::to_bytes(body, handlers.max_body_bytes)
        .await
        .map_err(|e| body_error(e, handlers.max_body_bytes))?;

    let remote_addr = ctx
        .parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let request = HandlerRequest {
        script,
        method: ctx.parts.method.clone(),
        uri: ctx.parts.uri.clone(),
        headers: ctx.parts.headers.clone(),
        body,
        remote_addr,
    };

    Ok(Outcome::Handled(state.invoker.invoke(request).await?))
}

/// Only an exceeded limit is a 413; anything else is a broken request body.
pub(crate) fn body_error(err: axum::Error, limit: usize) -> AppError {
    let inner = err.into_inner();
    if inner.is::<LengthLimitError>() {
        AppError::PayloadTooLarge(limit)
    } else {
        tracing::info!("Failed to read request body: {}", inner);
        AppError::Validation(format!("Failed to read request body: {}", inner))
    }
}

async fn upload_asset(state: &AppState, ctx: &mut RequestContext) -> AppResult<Outcome> {
    if !uploads::is_upload_path(&ctx.path) {
        return Ok(Outcome::Pass);
    }

    if let Some(resp) = uploads::serve(&state.config.paths.uploads_root, &ctx.path).await? {
        return Ok(Outcome::Handled(resp));
    }

    if state.config.uploads.missing_falls_through {
        tracing::warn!("Upload {} missing, falling through to static/SPA handling", ctx.path);
        Ok(Outcome::Pass)
    } else {
        tracing::info!("Upload {} not found", ctx.path);
        Ok(Outcome::Handled(shell::not_found()))
    }
}
