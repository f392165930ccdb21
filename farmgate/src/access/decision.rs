//! The access decision engine.
//!
//! [`DecisionEngine::decide`] is the only function the rest of the
//! application calls to answer "may this session open this route". It is a
//! pure function of its arguments (plus the clock, for session expiry):
//! calling it twice with the same inputs yields the same verdict, and it
//! never mutates session state.

use chrono::Utc;
use uuid::Uuid;

use crate::access::matrix::AccessMatrix;
use crate::access::route::normalize;
use crate::types::{ProfileType, Session};

/// Authorization verdict for a (route, session) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through.
    Allow,
    /// Block the request and send the caller to `target` (login, the
    /// password-reset flow, or the configured denial page).
    Deny { target: String },
    /// The route is permitted, but the caller entered through the generic
    /// entry point and is forwarded to their role home instead.
    RedirectHome { target: String },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// The redirect target, if this verdict carries one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::Deny { target } | Decision::RedirectHome { target } => Some(target),
        }
    }
}

/// Decides route access against the authored matrix.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    matrix: AccessMatrix,
}

impl DecisionEngine {
    pub fn new(matrix: AccessMatrix) -> Self {
        Self { matrix }
    }

    /// True if the route requires no session at all.
    pub fn is_public(&self, route: &str) -> bool {
        self.matrix.is_public(route)
    }

    /// Decide whether `session` may open `route`.
    ///
    /// Authentication-state checks run before any matrix lookup, so an
    /// anonymous or degraded caller learns nothing about role-specific rules:
    ///
    /// 1. public routes are always allowed;
    /// 2. a missing or expired session is denied toward login;
    /// 3. a degraded (token-less) session is denied toward the reset route,
    ///    unless that is the route being requested;
    /// 4. otherwise the matrix rule for (route, profile) applies, with the
    ///    landing redirect honored only on the generic entry point `/`.
    pub fn decide(&self, route: &str, session: Option<&Session>) -> Decision {
        let path = normalize(route);

        if self.matrix.is_public(&path) {
            return Decision::Allow;
        }

        let session = match session {
            Some(s) if !s.is_expired() => s,
            _ => {
                return Decision::Deny {
                    target: self.matrix.login_route().to_string(),
                }
            }
        };

        if session.is_degraded() && path != self.matrix.reset_route() {
            return Decision::Deny {
                target: self.matrix.reset_route().to_string(),
            };
        }

        let rule = self.matrix.lookup(&path, session.profile_type);
        if !rule.access {
            return Decision::Deny {
                target: rule
                    .denied_redirect
                    .unwrap_or_else(|| self.matrix.login_route().to_string()),
            };
        }

        if path == "/" {
            if let Some(target) = rule.landing_redirect {
                return Decision::RedirectHome { target };
            }
        }

        Decision::Allow
    }

    /// Routes a member of `profile` may open, for menu construction.
    ///
    /// Derived through [`decide`](Self::decide) with a synthetic
    /// fully-authenticated session, so menu visibility cannot drift from the
    /// guards' verdicts. Parameterized templates are excluded, since they do not
    /// denote a single linkable page.
    pub fn accessible_routes(&self, profile: ProfileType) -> Vec<String> {
        let probe = probe_session(profile);
        self.matrix
            .entries()
            .filter(|entry| !entry.pattern.has_params())
            .filter(|entry| self.decide(entry.pattern.as_str(), Some(&probe)).is_allow())
            .map(|entry| entry.pattern.as_str().to_string())
            .collect()
    }

    /// Every page route the gateway serves, in axum router syntax: the
    /// matrix rows plus the public routes.
    pub fn page_routes(&self) -> Vec<String> {
        self.matrix
            .entries()
            .map(|entry| entry.pattern.axum_path())
            .chain(self.matrix.public_patterns().map(|p| p.axum_path()))
            .collect()
    }

    pub fn matrix(&self) -> &AccessMatrix {
        &self.matrix
    }
}

/// A representative fully-authenticated session of the given profile, used
/// to probe the matrix through `decide` for menu construction.
fn probe_session(profile: ProfileType) -> Session {
    Session {
        user_id: Uuid::nil(),
        email: String::new(),
        profile_type: profile,
        access_token: Some(String::new()),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}
