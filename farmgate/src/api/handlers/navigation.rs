//! Navigation-menu endpoint.
//!
//! The third consumer of the decision engine: it decides which links to
//! *display*, not to enforce. Everything it returns comes from
//! [`DecisionEngine::accessible_routes`](crate::access::DecisionEngine::accessible_routes),
//! never from rules re-encoded here.

use axum::{extract::State, Json};

use crate::{api::models::navigation::NavigationResponse, auth::current_session::CurrentSession, errors::Error, AppState};

/// Menu links for the current profile
#[utoipa::path(
    get,
    path = "/api/navigation",
    tag = "navigation",
    responses(
        (status = 200, description = "Routes the current profile may open", body = NavigationResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Password reset required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_navigation(State(state): State<AppState>, CurrentSession(current): CurrentSession) -> Result<Json<NavigationResponse>, Error> {
    // A degraded session has exactly one destination; there is no menu to
    // build for it.
    if current.session.is_degraded() {
        return Err(Error::DegradedSession);
    }

    let profile_type = current.session.profile_type;
    Ok(Json(NavigationResponse {
        profile_type,
        routes: state.engine.accessible_routes(profile_type),
    }))
}
