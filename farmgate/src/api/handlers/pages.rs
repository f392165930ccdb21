//! Page-shell handler for the marketplace routes.
//!
//! Every route in the matrix (plus the public auth screens) is served by
//! this single handler. The [`RouteAccess`] extractor is the page-level
//! guard: by the time the handler body runs, `decide()` has allowed the
//! navigation; the handler just reports the context the rendering layer in
//! front of the gateway needs.

use axum::{extract::State, Json};

use crate::{
    api::models::{auth::SessionSnapshot, pages::PageContext},
    auth::current_session::RouteAccess,
    AppState,
};

#[tracing::instrument(skip_all)]
pub async fn render_page(State(state): State<AppState>, access: RouteAccess) -> Json<PageContext> {
    Json(PageContext {
        public: state.engine.is_public(&access.route),
        session: access.session.as_ref().map(|r| SessionSnapshot::from(r.session.as_ref())),
        route: access.route,
    })
}
