//! Page-shell context returned for guarded page routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::auth::SessionSnapshot;

/// Context the rendering layer needs for a page the guard let through.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageContext {
    /// The normalized route that was requested
    pub route: String,
    /// Whether the route is public (no session required)
    pub public: bool,
    /// The caller's session, absent on anonymous access to public routes
    pub session: Option<SessionSnapshot>,
}
