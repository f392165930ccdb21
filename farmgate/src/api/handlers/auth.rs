//! Session endpoints: login, logout, snapshot/refresh, password reset.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    api::models::auth::{
        AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, ResetPasswordRequest, SessionQuery,
        SessionSnapshot,
    },
    auth::{
        current_session::{claims_from_headers, CurrentSession},
        token,
    },
    backend::CredentialExchange,
    errors::Error,
    types::Session,
    AppState,
};

/// Build a session from a backend credential exchange.
fn session_from_exchange(exchange: CredentialExchange, state: &AppState) -> Session {
    Session {
        user_id: exchange.user.id,
        email: exchange.user.email,
        profile_type: exchange.user.profile_type,
        access_token: exchange.access_token,
        expires_at: state.config.session_expiry(),
    }
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "session",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Backend unreachable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    // A connect failure surfaces as 503 here; it must never mint a cookie.
    let exchange = state.backend.login(&request.email, &request.password).await?;

    let session = session_from_exchange(exchange, &state);
    let snapshot = SessionSnapshot::from(&session);
    let degraded = session.is_degraded();

    let sid = state.sessions.insert(session);
    let jwt = token::create_session_token(snapshot.user_id, sid, &state.config)?;
    let cookie = create_session_cookie(&jwt, &state.config);

    let auth_response = AuthResponse {
        session: snapshot,
        message: if degraded {
            "Password reset required before further access".to_string()
        } else {
            "Login successful".to_string()
        },
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "session",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<LogoutResponse, Error> {
    // Clear the store entry even if it already expired; an unverifiable
    // cookie just means there is nothing to clear.
    if let Some(claims) = claims_from_headers(&headers, &state.config) {
        state.sessions.remove(claims.sid);
    }

    let cookie = clear_session_cookie(&state.config);
    let auth_response = AuthSuccessResponse {
        message: "Logout successful".to_string(),
    };

    Ok(LogoutResponse { auth_response, cookie })
}

/// Current session snapshot for client-side guards
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "session",
    params(SessionQuery),
    responses(
        (status = 200, description = "Current session", body = SessionSnapshot),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "Backend unreachable during refresh"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    CurrentSession(current): CurrentSession,
) -> Result<Json<SessionSnapshot>, Error> {
    // Degraded sessions have no token to refresh with; the snapshot alone
    // tells the client to route to the reset flow.
    let access_token = if query.refresh { current.session.access_token.clone() } else { None };

    let Some(access_token) = access_token else {
        return Ok(Json(SessionSnapshot::from(current.session.as_ref())));
    };

    match state.backend.fetch_session(&access_token).await {
        Ok(user) => {
            let refreshed = Session {
                user_id: user.id,
                email: user.email,
                profile_type: user.profile_type,
                access_token: Some(access_token),
                expires_at: state.config.session_expiry(),
            };
            let snapshot = SessionSnapshot::from(&refreshed);

            if state.sessions.replace_if_current(current.sid, current.generation, refreshed) {
                Ok(Json(snapshot))
            } else {
                // A newer update (login, logout, another refresh) won the
                // race; this result is discarded and the live state answers.
                let live = state.sessions.get(current.sid).ok_or(Error::Unauthenticated { message: None })?;
                Ok(Json(SessionSnapshot::from(live.session.as_ref())))
            }
        }
        Err(Error::Unauthenticated { .. }) => {
            // The backend declared the session dead; every session of this
            // user is forced back through login.
            state.sessions.remove_user(current.session.user_id);
            Err(Error::Unauthenticated { message: None })
        }
        // BackendUnavailable and friends surface as-is: a retryable error,
        // never a silent allow.
        Err(e) => Err(e),
    }
}

/// Complete the forced password-reset flow
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "session",
    responses(
        (status = 200, description = "Password reset, session upgraded", body = AuthResponse),
        (status = 401, description = "Not authenticated or invalid temporary password"),
        (status = 503, description = "Backend unreachable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    CurrentSession(current): CurrentSession,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, Error> {
    let exchange = state
        .backend
        .validate_reset_password(&request.email, &request.temporary_password, &request.new_password)
        .await?;

    let upgraded = session_from_exchange(exchange, &state);
    let snapshot = SessionSnapshot::from(&upgraded);

    if !state.sessions.replace_if_current(current.sid, current.generation, upgraded) {
        // Superseded while the backend call was in flight; answer with
        // whatever state won.
        let live = state.sessions.get(current.sid).ok_or(Error::Unauthenticated { message: None })?;
        return Ok(Json(AuthResponse {
            session: SessionSnapshot::from(live.session.as_ref()),
            message: "Password has been reset".to_string(),
        }));
    }

    Ok(Json(AuthResponse {
        session: snapshot,
        message: "Password has been reset".to_string(),
    }))
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.session;
    let max_age = session_config.timeout.as_secs();
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, secure, session_config.cookie_same_site, max_age
    )
}

/// Helper function to create an expired cookie clearing the session
fn clear_session_cookie(config: &crate::config::Config) -> String {
    let session_config = &config.auth.session;
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}=; Path=/; HttpOnly{}; SameSite={}; Max-Age=0",
        session_config.cookie_name, secure, session_config.cookie_same_site
    )
}
