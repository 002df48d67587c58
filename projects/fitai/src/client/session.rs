use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

/// Response of the session-check endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Per-login client state: the current CSRF token and the signed-in user.
///
/// One `Session` lives as long as one authenticated session; it is owned by
/// the `ApiClient` and shared with anything that issues requests through it.
#[derive(Debug, Default)]
pub struct Session {
    csrf_token: RwLock<Option<String>>,
    user: RwLock<Option<Value>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn csrf_token(&self) -> Option<String> {
        self.csrf_token.read().await.clone()
    }

    pub async fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.write().await = token;
    }

    pub async fn user(&self) -> Option<Value> {
        self.user.read().await.clone()
    }

    pub async fn set_user(&self, user: Option<Value>) {
        *self.user.write().await = user;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Adopt the state reported by the session-check endpoint.
    pub async fn apply(&self, info: &SessionInfo) {
        self.set_csrf_token(info.csrf_token.clone()).await;
        let user = if info.authenticated { info.user.clone() } else { None };
        self.set_user(user).await;
    }

    /// Forget the user but keep the CSRF token; the server rotates it on
    /// the next response.
    pub async fn sign_out(&self) {
        self.set_user(None).await;
    }
}
