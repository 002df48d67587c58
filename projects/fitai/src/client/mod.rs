//! JSON API client used by the SPA glue: one fetch wrapper with CSRF
//! propagation, typed endpoint groups, the client route table and the chat
//! poller.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub mod endpoints;
pub mod error;
pub mod poller;
pub mod route;
pub mod session;

pub use error::ApiError;
pub use session::{Session, SessionInfo};

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";
/// Body field carrying the CSRF token on mutating requests.
pub const CSRF_FIELD: &str = "csrf_token";
/// Session-check endpoint used by `ApiClient::init`.
pub const SESSION_ENDPOINT: &str = "/auth/session.php";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            Payload::Json(v) => Ok(v),
            Payload::Text(t) => Err(ApiError::Decode(format!(
                "expected JSON, got text ({} bytes)",
                t.len()
            ))),
        }
    }

    fn csrf_token(&self) -> Option<&str> {
        match self {
            Payload::Json(v) => v.get(CSRF_FIELD).and_then(Value::as_str),
            Payload::Text(_) => None,
        }
    }
}

/// Fetch wrapper over the `/api` prefix. One attempt per call: no retry,
/// no backoff.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// `base_url` is the API prefix, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::build(base_url.into(), None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Self::build(base_url.into(), Some(timeout))
    }

    fn build(base_url: String, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("fitai-client/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Arc::new(Session::new()),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Check the session once and cache its CSRF token.
    ///
    /// Failure is not fatal: the result is an anonymous session.
    pub async fn init(&self) -> SessionInfo {
        let info = match self.get(SESSION_ENDPOINT, &[]).await.and_then(Payload::into_json) {
            Ok(json) => serde_json::from_value::<SessionInfo>(json).unwrap_or_else(|e| {
                tracing::warn!("Unexpected session payload: {}", e);
                SessionInfo::default()
            }),
            Err(e) => {
                tracing::error!("Failed to initialize API session: {}", e);
                SessionInfo::default()
            }
        };
        self.session.apply(&info).await;
        info
    }

    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Payload, ApiError> {
        let response = self
            .http
            .get(self.url(endpoint))
            .query(params)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        handle_response(response).await
    }

    pub async fn post(&self, endpoint: &str, data: Value) -> Result<Payload, ApiError> {
        self.mutate(reqwest::Method::POST, endpoint, data).await
    }

    pub async fn delete(&self, endpoint: &str, data: Value) -> Result<Payload, ApiError> {
        self.mutate(reqwest::Method::DELETE, endpoint, data).await
    }

    async fn mutate(&self, method: reqwest::Method, endpoint: &str, data: Value) -> Result<Payload, ApiError> {
        let token = self.session.csrf_token().await;
        let body = with_csrf(data, token.as_deref());

        let response = self
            .http
            .request(method, self.url(endpoint))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(CSRF_HEADER, token.as_deref().unwrap_or(""))
            .json(&body)
            .send()
            .await?;

        let payload = handle_response(response).await?;

        if let Some(fresh) = payload.csrf_token() {
            if token.as_deref() != Some(fresh) {
                tracing::debug!("CSRF token rotated by {}", endpoint);
            }
            self.session.set_csrf_token(Some(fresh.to_string())).await;
        }

        Ok(payload)
    }
}

/// Attach the token as a body field. Non-object bodies are sent unchanged.
fn with_csrf(data: Value, token: Option<&str>) -> Value {
    let mut data = match data {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    if let (Some(token), Some(map)) = (token, data.as_object_mut()) {
        map.insert(CSRF_FIELD.to_string(), Value::String(token.to_string()));
    }
    data
}

async fn handle_response(response: reqwest::Response) -> Result<Payload, ApiError> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        let data: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !status.is_success() {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Request failed")
                .to_string();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
                body: Some(data),
            });
        }

        return Ok(Payload::Json(data));
    }

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: "Request failed".to_string(),
            body: None,
        });
    }

    Ok(Payload::Text(response.text().await?))
}
