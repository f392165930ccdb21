//! Edge guard middleware.
//!
//! Runs before any page handler for every navigation except static assets,
//! health, docs, and the auth API routes. On a deny or landing verdict it
//! short-circuits the response with a redirect before any page code runs.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, trace};

use crate::{access::Decision, auth::current_session::session_from_headers, types::abbrev_uuid, AppState};

/// Paths the edge guard passes through untouched: the session/auth API (it
/// must be reachable to establish a session in the first place), static
/// assets, docs and health.
const GUARD_EXEMPT_PREFIXES: &[&str] = &["/api/", "/assets/", "/docs", "/healthz", "/favicon.ico"];

fn is_exempt(path: &str) -> bool {
    GUARD_EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Implementation for route_guard_middleware. Returns the verdict so the
/// wrapper (and tests) can act on it.
pub(crate) fn edge_decision(state: &AppState, request: &Request) -> Option<Decision> {
    let path = request.uri().path();
    if is_exempt(path) {
        return None;
    }

    let session = session_from_headers(request.headers(), state);
    match &session {
        Some(s) => trace!("Edge guard resolved user {} for {}", abbrev_uuid(&s.session.user_id), path),
        None => trace!("Edge guard resolved anonymous caller for {}", path),
    }

    Some(state.engine.decide(path, session.as_ref().map(|r| r.session.as_ref())))
}

/// Middleware enforcing the access decision at the edge, before any page
/// handler runs.
pub async fn route_guard_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match edge_decision(&state, &request) {
        None | Some(Decision::Allow) => next.run(request).await,
        Some(Decision::Deny { target }) => {
            debug!("Edge guard denying {} -> {}", request.uri().path(), target);
            Redirect::temporary(&target).into_response()
        }
        Some(Decision::RedirectHome { target }) => {
            debug!("Edge guard forwarding {} -> {}", request.uri().path(), target);
            Redirect::temporary(&target).into_response()
        }
    }
}
