use std::fmt;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
};
use gatekeep_core::Credentials;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Body of both `/auth/register` and `/auth/login`.
#[derive(Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<AuthRequest> for Credentials {
    fn from(request: AuthRequest) -> Self {
        Credentials::new(request.username, request.password)
    }
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    /// Unix seconds.
    pub expires_at: i64,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(request) = payload?;

    state.coordinator.register(request.into()).await?;

    Ok(StatusCode::OK)
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(request) = payload?;

    let issued = state.coordinator.login(request.into()).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
    }))
}

/// Identity and expiry behind the presented bearer token.
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SessionResponse>> {
    let token = bearer_token(&headers).ok_or_else(|| {
        debug!("missing or malformed authorization header");
        AppError::unauthorized("Missing bearer token")
    })?;

    let session = state
        .coordinator
        .authenticate(token)
        .await
        .map_err(|err| match err {
            gatekeep_core::AuthError::Unauthorized => {
                AppError::unauthorized("Invalid or expired token")
            }
            other => other.into(),
        })?;

    Ok(Json(SessionResponse {
        user_id: session.user_id.to_string(),
        expires_at: session.expires_at.timestamp(),
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn request_debug_hides_password() {
        let request = AuthRequest {
            username: "bob".into(),
            password: "pw1".into(),
        };
        let printed = format!("{request:?}");
        assert!(printed.contains("bob"));
        assert!(!printed.contains("pw1"));
    }
}
