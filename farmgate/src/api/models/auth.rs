//! API request/response models for session endpoints.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::types::{ProfileType, Session, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub temporary_password: String,
    pub new_password: String,
}

/// Session snapshot for client-side guards. Never carries the raw backend
/// token, only whether one is present.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSnapshot {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub email: String,
    pub profile_type: ProfileType,
    pub token_present: bool,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            email: session.email.clone(),
            profile_type: session.profile_type,
            token_present: session.access_token.is_some(),
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub session: SessionSnapshot,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Query parameters for the session endpoint
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct SessionQuery {
    /// Re-fetch the session from the backend before answering
    #[serde(default)]
    pub refresh: bool,
}

/// Login response bundling the body with the session cookie.
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();
        set_cookie_header(&mut response, &self.cookie);
        response
    }
}

/// Logout response clearing the session cookie.
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();
        set_cookie_header(&mut response, &self.cookie);
        response
    }
}

fn set_cookie_header(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(e) => {
            tracing::error!("Session cookie is not a valid header value: {e}");
        }
    }
}
