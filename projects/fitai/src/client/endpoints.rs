//! Typed endpoint groups over `ApiClient`.

use serde_json::{json, Value};

use super::{ApiClient, ApiError, Payload};

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi(self)
    }

    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi(self)
    }

    pub fn plans(&self) -> PlansApi<'_> {
        PlansApi(self)
    }

    pub fn logs(&self) -> LogsApi<'_> {
        LogsApi(self)
    }

    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi(self)
    }

    pub fn exercises(&self) -> ExercisesApi<'_> {
        ExercisesApi(self)
    }

    pub fn messages(&self) -> MessagesApi<'_> {
        MessagesApi(self)
    }
}

/// Whether a handler reported success under the `success` boolean convention.
pub fn is_success(payload: &Value) -> bool {
    payload.get("success").and_then(Value::as_bool).unwrap_or(false)
}

pub struct AuthApi<'a>(&'a ApiClient);

impl AuthApi<'_> {
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ApiError> {
        let result = self
            .0
            .post("/auth/login.php", json!({ "email": email, "password": password }))
            .await?
            .into_json()?;
        if is_success(&result) {
            self.0.session().set_user(result.get("user").cloned()).await;
        }
        Ok(result)
    }

    pub async fn register(&self, email: &str, password: &str, password_confirm: &str) -> Result<Value, ApiError> {
        self.0
            .post(
                "/auth/register.php",
                json!({
                    "email": email,
                    "password": password,
                    "password_confirm": password_confirm,
                }),
            )
            .await?
            .into_json()
    }

    pub async fn logout(&self) -> Result<Value, ApiError> {
        let result = self.0.post("/auth/logout.php", Value::Null).await?.into_json()?;
        self.0.session().sign_out().await;
        Ok(result)
    }

    pub async fn check_session(&self) -> Result<Value, ApiError> {
        self.0.get(super::SESSION_ENDPOINT, &[]).await?.into_json()
    }
}

pub struct ProfileApi<'a>(&'a ApiClient);

impl ProfileApi<'_> {
    pub async fn get(&self) -> Result<Value, ApiError> {
        self.0.get("/profile/get.php", &[]).await?.into_json()
    }

    pub async fn update(&self, profile: Value) -> Result<Value, ApiError> {
        self.0.post("/profile/update.php", profile).await?.into_json()
    }
}

pub struct PlansApi<'a>(&'a ApiClient);

impl PlansApi<'_> {
    pub async fn get(&self, week_start: Option<&str>) -> Result<Value, ApiError> {
        let params: Vec<(&str, String)> = week_start
            .map(|w| vec![("week_start", w.to_string())])
            .unwrap_or_default();
        self.0.get("/plans/get.php", &params).await?.into_json()
    }

    pub async fn generate(&self) -> Result<Value, ApiError> {
        self.0.post("/plans/generate.php", Value::Null).await?.into_json()
    }

    pub async fn regenerate(&self) -> Result<Value, ApiError> {
        self.0.post("/plans/regenerate.php", Value::Null).await?.into_json()
    }

    pub async fn adjust(&self) -> Result<Value, ApiError> {
        self.0.post("/plans/adjust.php", Value::Null).await?.into_json()
    }
}

pub struct LogsApi<'a>(&'a ApiClient);

impl LogsApi<'_> {
    pub async fn save(
        &self,
        plan_day_id: i64,
        status: &str,
        fatigue_rating: Option<u8>,
        notes: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.0
            .post(
                "/logs/save.php",
                json!({
                    "plan_day_id": plan_day_id,
                    "status": status,
                    "fatigue_rating": fatigue_rating,
                    "notes": notes,
                }),
            )
            .await?
            .into_json()
    }

    pub async fn get(&self, week_start: Option<&str>, limit: u32) -> Result<Value, ApiError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(week_start) = week_start {
            params.push(("week_start", week_start.to_string()));
        }
        self.0.get("/logs/get.php", &params).await?.into_json()
    }
}

pub struct DashboardApi<'a>(&'a ApiClient);

impl DashboardApi<'_> {
    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.0.get("/dashboard/stats.php", &[]).await?.into_json()
    }
}

pub struct ExercisesApi<'a>(&'a ApiClient);

impl ExercisesApi<'_> {
    pub async fn list(&self, filters: &[(&str, String)]) -> Result<Value, ApiError> {
        self.0.get("/exercises/list.php", filters).await?.into_json()
    }
}

pub struct MessagesApi<'a>(&'a ApiClient);

impl MessagesApi<'_> {
    pub async fn list(&self, friend_id: i64) -> Result<Value, ApiError> {
        self.0
            .get("/messages.php", &[("friend_id", friend_id.to_string())])
            .await
            .and_then(Payload::into_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_convention() {
        assert!(is_success(&json!({"success": true})));
        assert!(!is_success(&json!({"success": false})));
        assert!(!is_success(&json!({"success": "yes"})));
        assert!(!is_success(&json!({})));
    }
}
