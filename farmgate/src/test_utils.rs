//! Shared constructors for tests.

use std::sync::Arc;

use axum::ServiceExt;
use axum_test::TestServer;
use chrono::Utc;
use tower::Layer;
use uuid::Uuid;

use crate::{
    access::{AccessMatrix, DecisionEngine},
    auth::{middleware::route_guard_middleware, store::SessionStore, token},
    backend::BackendClient,
    config::Config,
    types::{ProfileType, Session, SessionId},
    AppState,
};

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        ..Config::default()
    }
}

pub fn create_test_session(profile_type: ProfileType) -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: format!("{profile_type}@example.com").to_lowercase(),
        profile_type,
        access_token: Some("backend-token".to_string()),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

fn ensure_crypto_provider() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

pub fn create_test_state(config: Config) -> AppState {
    ensure_crypto_provider();
    let engine = DecisionEngine::new(AccessMatrix::new(&config.access));
    let backend = BackendClient::new(&config.backend).expect("test backend client");

    AppState::builder()
        .config(config)
        .engine(Arc::new(engine))
        .sessions(Arc::new(SessionStore::new()))
        .backend(Arc::new(backend))
        .build()
}

/// Full router with the edge guard applied before path matching, as in
/// `Application::serve`.
pub fn create_test_server(state: AppState) -> TestServer {
    let router = crate::build_router(&state).expect("test router");
    let middleware = axum::middleware::from_fn_with_state(state, route_guard_middleware);
    let service = middleware.layer(router).into_make_service();
    TestServer::new(service).expect("Failed to create test server")
}

/// Store a session and mint its cookie, as the login handler would.
pub fn session_cookie(state: &AppState, session: Session) -> (String, SessionId) {
    let user_id = session.user_id;
    let sid = state.sessions.insert(session);
    let jwt = token::create_session_token(user_id, sid, &state.config).expect("test session token");
    (format!("{}={}", state.config.auth.session.cookie_name, jwt), sid)
}
