//! Route-access control: the authoritative matrix and the decision engine.
//!
//! Every enforcement point in the gateway (the edge middleware, the
//! page-level extractor, and the navigation-menu filter) consults this
//! module through [`DecisionEngine::decide`] and acts on the verdict. None of
//! them carry their own copy of the rules; the matrix in [`matrix`] is the
//! single source of truth.
//!
//! # Modules
//!
//! - [`route`]: path normalization and `[param]` route templates
//! - [`matrix`]: the authored per-route, per-profile rule table
//! - [`decision`]: the pure `decide(route, session)` verdict function
//!
//! # Decision Ordering
//!
//! Authentication-state checks always run before authorization checks: an
//! anonymous or half-authenticated caller is redirected to the login or
//! password-reset flow without ever touching the rule table, so the shape of
//! role-specific rules is never observable to unauthenticated traffic.

pub mod decision;
pub mod matrix;
pub mod route;

pub use decision::{Decision, DecisionEngine};
pub use matrix::{AccessMatrix, AccessRule};
pub use route::{normalize, RoutePattern};
