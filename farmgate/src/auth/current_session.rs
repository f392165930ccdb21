//! Extractors for resolving the current session in handlers.
//!
//! [`CurrentSession`] is for API handlers that require an authenticated
//! caller. [`RouteAccess`] is the page-level guard: it resolves the session
//! *and* re-runs the full access decision for the requested route, rejecting
//! with a redirect response; it deliberately does more than check that a
//! login exists.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, trace};

use crate::{
    access::{route::normalize, Decision},
    auth::{store::SessionRef, token},
    errors::Error,
    AppState,
};

/// Extract verified session claims from the cookie header, if any.
///
/// Invalid, expired or unverifiable cookies resolve to `None`: an anonymous
/// caller, never an error. Guards must fail closed, not loudly.
pub(crate) fn claims_from_headers(headers: &HeaderMap, config: &crate::config::Config) -> Option<token::SessionClaims> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match token::verify_session_token(value, config) {
                    Ok(claims) => return Some(claims),
                    Err(_) => {
                        // Invalid/expired token, continue checking other cookies
                        // We don't propagate verification errors as they're expected for expired tokens
                        continue;
                    }
                }
            }
        }
    }
    None
}

/// Resolve the live session for a request: cookie, signature, store lookup.
pub(crate) fn session_from_headers(headers: &HeaderMap, state: &AppState) -> Option<SessionRef> {
    let claims = claims_from_headers(headers, &state.config)?;
    let session = state.sessions.get(claims.sid);
    if session.is_none() {
        trace!("Cookie names session {} but the store has no live entry", claims.sid);
    }
    session
}

/// The authenticated session, required.
pub struct CurrentSession(pub SessionRef);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_from_headers(&parts.headers, state)
            .map(CurrentSession)
            .ok_or(Error::Unauthenticated { message: None })
    }
}

/// Rejection for [`RouteAccess`]: a redirect, never an error page.
pub struct GuardRedirect {
    pub target: String,
}

impl IntoResponse for GuardRedirect {
    fn into_response(self) -> Response {
        Redirect::temporary(&self.target).into_response()
    }
}

/// Page-level guard: the session (if any) plus a fresh access decision for
/// the requested route. Handlers taking this extractor only run on an
/// `Allow` verdict.
pub struct RouteAccess {
    /// The normalized route that was requested.
    pub route: String,
    /// The resolved session; `None` on public routes.
    pub session: Option<SessionRef>,
}

impl FromRequestParts<AppState> for RouteAccess {
    type Rejection = GuardRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let route = normalize(parts.uri.path());
        let session = session_from_headers(&parts.headers, state);

        match state.engine.decide(&route, session.as_ref().map(|r| r.session.as_ref())) {
            Decision::Allow => Ok(RouteAccess { route, session }),
            Decision::Deny { target } | Decision::RedirectHome { target } => {
                debug!("Page guard rejecting {} -> {}", route, target);
                Err(GuardRedirect { target })
            }
        }
    }
}
