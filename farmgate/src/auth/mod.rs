//! Session lifecycle and route guards.
//!
//! This module owns everything between the browser and the decision engine:
//!
//! - [`token`]: the gateway-signed JWT session cookie
//! - [`store`]: the server-side session store (login, refresh, logout)
//! - [`current_session`]: extractors that resolve the session for handlers
//! - [`middleware`]: the edge guard that runs before any page handler
//!
//! # Enforcement Points
//!
//! Route access is enforced redundantly at three points, all of which call
//! [`DecisionEngine::decide`](crate::access::DecisionEngine::decide) and act
//! on its verdict identically:
//!
//! 1. The **edge guard** ([`middleware::route_guard_middleware`]) intercepts
//!    every navigation before any handler runs and short-circuits with a
//!    redirect on a deny or landing verdict.
//! 2. The **page wrapper** ([`current_session::RouteAccess`]) re-runs the
//!    full decision when the page handler executes, not just an
//!    is-logged-in check.
//! 3. The **navigation filter** (`/api/navigation`) derives the set of links
//!    to display from the same engine, read-only.
//!
//! # Failure Semantics
//!
//! Session resolution never fails open: a missing, malformed, expired or
//! unverifiable cookie resolves to "anonymous", and the decision engine then
//! denies toward the login route. Guard-level failures never propagate as
//! errors past the guard boundary.

pub mod current_session;
pub mod middleware;
pub mod store;
pub mod token;
