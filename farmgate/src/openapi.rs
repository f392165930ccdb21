//! OpenAPI documentation configuration.
//!
//! Covers the JSON API surface (session + navigation endpoints). The page
//! routes are not part of the API contract; they are whatever the access
//! matrix says they are.

use utoipa::OpenApi;

use crate::api::models::{
    auth::{AuthResponse, AuthSuccessResponse, LoginRequest, ResetPasswordRequest, SessionSnapshot},
    navigation::NavigationResponse,
    pages::PageContext,
};
use crate::types::ProfileType;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::get_session,
        crate::api::handlers::auth::reset_password,
        crate::api::handlers::navigation::get_navigation,
    ),
    components(schemas(
        LoginRequest,
        ResetPasswordRequest,
        SessionSnapshot,
        AuthResponse,
        AuthSuccessResponse,
        NavigationResponse,
        PageContext,
        ProfileType,
    )),
    tags(
        (name = "session", description = "Session lifecycle: login, logout, snapshot, password reset"),
        (name = "navigation", description = "Menu construction for the current profile"),
    )
)]
pub struct ApiDoc;
