use anyhow::Result;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub mod assets;
pub mod cgi;
pub mod dispatch;
pub mod paths;
pub mod resolve;
pub mod router;
pub mod shell;
pub mod uploads;

use cgi::{CgiInvoker, HandlerInvoker};

pub struct AppState {
    pub config: Config,
    /// Runs resolved `/api/` handler scripts.
    pub invoker: Arc<dyn HandlerInvoker>,
}

impl AppState {
    pub fn new(config: Config, invoker: Arc<dyn HandlerInvoker>) -> Self {
        Self { config, invoker }
    }

    /// State backed by the CGI interpreter from `config.handlers`.
    pub fn with_cgi(config: Config) -> Self {
        let invoker = Arc::new(CgiInvoker::new(&config.handlers, config.paths.api_root.clone()));
        Self::new(config, invoker)
    }
}

pub async fn serve(cfg: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", cfg.server.bind, cfg.server.port);
    let cors = build_cors_layer(&cfg.server.cors_allowed_origins);
    let state = Arc::new(AppState::with_cgi(cfg));
    let app = build_app(state, cors);

    // Connect info feeds REMOTE_ADDR to handler scripts.
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Gateway listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    ).await?;
    Ok(())
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured; CORS will block all cross-origin requests");
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

pub fn build_app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .merge(router::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
