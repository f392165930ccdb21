//! API layer for HTTP request handling and data models.
//!
//! This module contains the gateway's HTTP surface, organized into:
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Session** (`/api/auth/*`): login, logout, session snapshot/refresh,
//!   password reset. Exempt from the edge guard so a session can be
//!   established in the first place
//! - **Navigation** (`/api/navigation`): menu links for the current profile
//! - **Pages** (everything else): the page-shell routes of the marketplace,
//!   guarded by the edge middleware and the page-level extractor
//!
//! All API endpoints are documented with OpenAPI annotations using `utoipa`;
//! the rendered documentation is served at `/docs`.

pub mod handlers;
pub mod models;
