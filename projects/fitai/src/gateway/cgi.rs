//! Handler invocation over CGI/1.1 (RFC 3875).
//!
//! The front controller does not interpret handler scripts itself. It runs
//! the configured interpreter (`php-cgi` by default) once per request,
//! feeds the request body on stdin and turns the CGI response on stdout
//! into an HTTP response. The handler owns status, headers and body.

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::Response,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::dispatch::HandlerScript;
use crate::config::HandlerConfig;
use crate::error::{AppError, AppResult};

/// Everything a handler needs to produce a response.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub script: HandlerScript,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub remote_addr: Option<SocketAddr>,
}

/// Runs a resolved handler script. Implementations own the whole response.
#[async_trait]
pub trait HandlerInvoker: Send + Sync {
    async fn invoke(&self, request: HandlerRequest) -> AppResult<Response>;
}

pub struct CgiInvoker {
    interpreter: String,
    document_root: PathBuf,
    timeout: Duration,
}

impl CgiInvoker {
    pub fn new(cfg: &HandlerConfig, document_root: PathBuf) -> Self {
        Self {
            interpreter: cfg.interpreter.clone(),
            document_root,
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

#[async_trait]
impl HandlerInvoker for CgiInvoker {
    async fn invoke(&self, request: HandlerRequest) -> AppResult<Response> {
        let env = cgi_env(&request, &self.document_root);

        let mut child = Command::new(&self.interpreter)
            .arg(&request.script.path)
            .env_clear()
            .envs(inherited_env())
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Handler(format!("failed to start {}: {}", self.interpreter, e)))?;

        let stdin = child.stdin.take();
        let body = request.body.clone();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A handler that never reads its body closes the pipe early.
                if let Err(e) = stdin.write_all(&body).await {
                    tracing::debug!("CGI stdin closed early: {}", e);
                }
                let _ = stdin.shutdown().await;
            }
        };

        let run = async {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                tracing::warn!(
                    "Handler {} exceeded {}s, killed",
                    request.script.path.display(),
                    self.timeout.as_secs()
                );
                AppError::Timeout(self.timeout.as_secs())
            })??;

        if !output.stderr.is_empty() {
            tracing::warn!(
                "Handler {} stderr: {}",
                request.script.path.display(),
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        if output.stdout.is_empty() && !output.status.success() {
            return Err(AppError::Handler(format!(
                "{} exited with {}",
                request.script.script_name, output.status
            )));
        }

        let parsed = parse_cgi_response(&output.stdout)?;
        tracing::debug!(
            "Handler {} → {}",
            request.script.script_name,
            parsed.status
        );
        Ok(parsed.into_response())
    }
}

/// Gateway variables a handler still sees; everything else is withheld.
const INHERITED_ENV: [&str; 2] = ["PATH", "SYSTEMROOT"];

fn inherited_env() -> Vec<(&'static str, std::ffi::OsString)> {
    INHERITED_ENV
        .iter()
        .filter_map(|key| std::env::var_os(key).map(|value| (*key, value)))
        .collect()
}

/// CGI meta-variables for one request.
pub fn cgi_env(request: &HandlerRequest, document_root: &std::path::Path) -> Vec<(String, String)> {
    let mut env = vec![
        ("GATEWAY_INTERFACE".to_string(), "CGI/1.1".to_string()),
        ("SERVER_PROTOCOL".to_string(), "HTTP/1.1".to_string()),
        ("SERVER_SOFTWARE".to_string(), format!("fitai/{}", env!("CARGO_PKG_VERSION"))),
        ("REQUEST_METHOD".to_string(), request.method.to_string()),
        ("REQUEST_URI".to_string(), request.uri.to_string()),
        ("SCRIPT_FILENAME".to_string(), request.script.path.display().to_string()),
        ("SCRIPT_NAME".to_string(), request.script.script_name.clone()),
        ("PATH_INFO".to_string(), String::new()),
        ("QUERY_STRING".to_string(), request.uri.query().unwrap_or("").to_string()),
        ("DOCUMENT_ROOT".to_string(), document_root.display().to_string()),
        // php-cgi refuses to run scripts without it (force-cgi-redirect)
        ("REDIRECT_STATUS".to_string(), "200".to_string()),
        ("CONTENT_LENGTH".to_string(), request.body.len().to_string()),
    ];

    if let Some(ct) = request.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        env.push(("CONTENT_TYPE".to_string(), ct.to_string()));
    }

    if let Some(addr) = request.remote_addr {
        env.push(("REMOTE_ADDR".to_string(), addr.ip().to_string()));
        env.push(("REMOTE_PORT".to_string(), addr.port().to_string()));
    }

    for (name, value) in request.headers.iter() {
        if *name == header::CONTENT_TYPE || *name == header::CONTENT_LENGTH {
            continue;
        }
        // httpoxy: never let a client set HTTP_PROXY for the handler
        if name.as_str().eq_ignore_ascii_case("proxy") {
            continue;
        }
        let Ok(value) = value.to_str() else { continue };
        let key = format!("HTTP_{}", name.as_str().to_ascii_uppercase().replace('-', "_"));
        env.push((key, value.to_string()));
    }

    env
}

/// A parsed CGI document response.
#[derive(Debug)]
pub struct CgiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CgiResponse {
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Split handler stdout into header block and body and parse the headers.
pub fn parse_cgi_response(raw: &[u8]) -> AppResult<CgiResponse> {
    let (head, body) = split_head(raw)
        .ok_or_else(|| AppError::Handler("handler output has no header block".to_string()))?;
    let head = std::str::from_utf8(head)
        .map_err(|_| AppError::Handler("handler headers are not valid UTF-8".to_string()))?;

    let mut status = None;
    let mut headers = HeaderMap::new();

    for line in head.lines() {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| AppError::Handler(format!("malformed handler header: {:?}", line)))?;
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("status") {
            status = Some(parse_status(value)?);
            continue;
        }

        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AppError::Handler(format!("invalid handler header name: {:?}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| AppError::Handler(format!("invalid value for header {}", name)))?;
        headers.append(name, value);
    }

    // RFC 3875 §6.2.3: a Location without Status is a client redirect.
    let status = match status {
        Some(s) => s,
        None if headers.contains_key(header::LOCATION) => StatusCode::FOUND,
        None => StatusCode::OK,
    };

    // Content-Length is recomputed from the body we actually send.
    headers.remove(header::CONTENT_LENGTH);

    Ok(CgiResponse {
        status,
        headers,
        body: Bytes::copy_from_slice(body),
    })
}

fn parse_status(value: &str) -> AppResult<StatusCode> {
    value
        .split_whitespace()
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| AppError::Handler(format!("invalid Status header: {:?}", value)))
}

fn split_head(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let crlf = raw.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    let lf = raw.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));

    let (at, len) = match (crlf, lf) {
        (Some(a), Some(b)) => if a.0 <= b.0 { a } else { b },
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&raw[..at], &raw[at + len..]))
}
