//! Client for the remote marketplace REST backend.
//!
//! The backend is an external collaborator: it owns users, credentials and
//! password resets. This client wraps the three calls the gateway consumes
//! and normalizes their failure modes:
//!
//! - any 401 is the uniform "session invalid" signal and maps to
//!   [`Error::Unauthenticated`]; callers treat it as session death;
//! - connection and timeout failures map to [`Error::BackendUnavailable`],
//!   which guards treat as "unauthenticated" (fail closed) and handlers
//!   surface as a retryable 503, never a silent allow.

use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    config::BackendConfig,
    errors::Error,
    types::{ProfileType, UserId},
};

/// User record as the backend reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
    pub id: UserId,
    pub email: String,
    #[serde(alias = "profileType")]
    pub profile_type: ProfileType,
}

/// Result of a credential exchange (login or reset-password validation).
///
/// `access_token` is null when the account must reset its password before it
/// can do anything else: the degraded session state.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialExchange {
    #[serde(default, alias = "accessToken")]
    pub access_token: Option<String>,
    pub user: BackendUser,
}

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal {
                operation: format!("build backend HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Exchange credentials for an access token and user record.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<CredentialExchange, Error> {
        let response = self
            .http
            .post(self.endpoint("auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| transport_error("log in", e))?;

        match response.status() {
            status if status.is_success() => {
                let exchange: CredentialExchange = response.json().await.map_err(|e| transport_error("log in", e))?;
                debug!(
                    "Backend authenticated {} as {} (token present: {})",
                    exchange.user.email,
                    exchange.user.profile_type,
                    exchange.access_token.is_some()
                );
                Ok(exchange)
            }
            StatusCode::UNAUTHORIZED => Err(Error::Unauthenticated {
                message: Some("Invalid email or password".to_string()),
            }),
            status if status.is_server_error() => Err(Error::BackendUnavailable {
                operation: "log in".to_string(),
            }),
            status => Err(Error::BadRequest {
                message: format!("Login rejected by backend ({status})"),
            }),
        }
    }

    /// Fetch the current session snapshot for a bearer token.
    #[instrument(skip_all)]
    pub async fn fetch_session(&self, access_token: &str) -> Result<BackendUser, Error> {
        let response = self
            .http
            .get(self.endpoint("auth/session"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| transport_error("fetch session", e))?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|e| transport_error("fetch session", e)),
            // 401 from any authenticated call means the session is dead
            StatusCode::UNAUTHORIZED => Err(Error::Unauthenticated { message: None }),
            status if status.is_server_error() => Err(Error::BackendUnavailable {
                operation: "fetch session".to_string(),
            }),
            status => Err(Error::Internal {
                operation: format!("fetch session: unexpected backend status {status}"),
            }),
        }
    }

    /// Complete the forced password-reset flow, clearing the token-less
    /// degraded state.
    #[instrument(skip_all)]
    pub async fn validate_reset_password(
        &self,
        email: &str,
        temporary_password: &str,
        new_password: &str,
    ) -> Result<CredentialExchange, Error> {
        let response = self
            .http
            .post(self.endpoint("users/validate-reset-password"))
            .json(&serde_json::json!({
                "email": email,
                "temporaryPassword": temporary_password,
                "newPassword": new_password,
            }))
            .send()
            .await
            .map_err(|e| transport_error("reset password", e))?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|e| transport_error("reset password", e)),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthenticated {
                message: Some("Invalid temporary password".to_string()),
            }),
            status if status.is_server_error() => Err(Error::BackendUnavailable {
                operation: "reset password".to_string(),
            }),
            status => Err(Error::BadRequest {
                message: format!("Password reset rejected by backend ({status})"),
            }),
        }
    }
}

/// Map a reqwest transport failure onto the error taxonomy. Unreachable
/// backends are retryable; everything else is an internal fault.
fn transport_error(operation: &str, e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::BackendUnavailable {
            operation: operation.to_string(),
        }
    } else {
        Error::Internal {
            operation: format!("{operation}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server_uri: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: Url::parse(server_uri).unwrap(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_partial_json(json!({ "email": "buyer@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "backend-token",
                "user": { "id": user_id, "email": "buyer@example.com", "profile_type": "ACHETEUR" }
            })))
            .mount(&server)
            .await;

        let exchange = client_for(&server.uri()).login("buyer@example.com", "secret").await.unwrap();
        assert_eq!(exchange.user.id, user_id);
        assert_eq!(exchange.user.profile_type, ProfileType::Acheteur);
        assert_eq!(exchange.access_token.as_deref(), Some("backend-token"));
    }

    #[tokio::test]
    async fn test_login_accepts_legacy_profile_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "backend-token",
                "user": { "id": Uuid::new_v4(), "email": "farmer@example.com", "profileType": "SUPPLIER" }
            })))
            .mount(&server)
            .await;

        let exchange = client_for(&server.uri()).login("farmer@example.com", "secret").await.unwrap();
        assert_eq!(exchange.user.profile_type, ProfileType::Agriculteur);
    }

    #[tokio::test]
    async fn test_login_degraded_token_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": null,
                "user": { "id": Uuid::new_v4(), "email": "new@example.com", "profile_type": "ACHETEUR" }
            })))
            .mount(&server)
            .await;

        let exchange = client_for(&server.uri()).login("new@example.com", "temporary").await.unwrap();
        assert!(exchange.access_token.is_none());
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).login("buyer@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_login_backend_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).login("buyer@example.com", "secret").await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_closed() {
        // Nothing listens here; the connection is refused.
        let client = client_for("http://127.0.0.1:9");
        let err = client.login("buyer@example.com", "secret").await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_session_success_and_session_death() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/session"))
            .and(header("authorization", "Bearer live-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": Uuid::new_v4(), "email": "buyer@example.com", "profile_type": "ACHETEUR"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/session"))
            .and(header("authorization", "Bearer dead-token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let user = client.fetch_session("live-token").await.unwrap();
        assert_eq!(user.email, "buyer@example.com");

        let err = client.fetch_session("dead-token").await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_validate_reset_password_returns_fresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/validate-reset-password"))
            .and(body_partial_json(json!({ "temporaryPassword": "temp123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-token",
                "user": { "id": Uuid::new_v4(), "email": "new@example.com", "profile_type": "ACHETEUR" }
            })))
            .mount(&server)
            .await;

        let exchange = client_for(&server.uri())
            .validate_reset_password("new@example.com", "temp123", "permanent456")
            .await
            .unwrap();
        assert_eq!(exchange.access_token.as_deref(), Some("fresh-token"));
    }
}
