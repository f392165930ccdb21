//! The authored access matrix.
//!
//! One table maps every known route to a per-profile [`AccessRule`]. The
//! table is assembled once at startup from [`AccessConfig`] and never mutated
//! afterwards; every guard consults it through [`AccessMatrix::lookup`]
//! rather than carrying its own copy of the rules.
//!
//! Historically this application shipped two diverging copies of the table
//! (one with the marketplace open to every profile, one restricting it to
//! buyers; one sending denials to `/`, one to `/auth/error`). Both axes are
//! now explicit configuration (see [`MarketplaceAccess`] and
//! [`DeniedRedirect`] in the config module), so a deployment picks a policy
//! instead of inheriting whichever copy a call site happened to import.

use std::collections::HashMap;

use crate::access::route::RoutePattern;
use crate::config::{AccessConfig, MarketplaceAccess};
use crate::types::ProfileType;

/// Per-(route, profile) rule.
///
/// The legacy data model overloaded a single `redirect` field for two
/// unrelated things; they are split here:
///
/// - `denied_redirect`: where to send the user when `access` is false.
/// - `landing_redirect`: the role home a permitted user is forwarded to when
///   the requested route is the generic entry point `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub access: bool,
    pub denied_redirect: Option<String>,
    pub landing_redirect: Option<String>,
}

fn allow() -> AccessRule {
    AccessRule {
        access: true,
        denied_redirect: None,
        landing_redirect: None,
    }
}

fn allow_landing(target: &str) -> AccessRule {
    AccessRule {
        access: true,
        denied_redirect: None,
        landing_redirect: Some(target.to_string()),
    }
}

fn deny(target: &str) -> AccessRule {
    AccessRule {
        access: false,
        denied_redirect: Some(target.to_string()),
        landing_redirect: None,
    }
}

/// One authored row: a route template and its per-profile rules.
#[derive(Debug, Clone)]
pub struct MatrixEntry {
    pub(crate) pattern: RoutePattern,
    rules: HashMap<ProfileType, AccessRule>,
}

/// The full mapping of every known route to per-profile rules, plus the set
/// of public routes that bypass the matrix entirely.
#[derive(Debug, Clone)]
pub struct AccessMatrix {
    entries: Vec<MatrixEntry>,
    public: Vec<RoutePattern>,
    login_route: String,
    reset_route: String,
}

impl AccessMatrix {
    /// Assemble the matrix for the configured policy. Called once at startup.
    pub fn new(access: &AccessConfig) -> Self {
        use ProfileType::*;

        let denied = access.denied_target().to_string();
        let mut entries = Vec::new();
        let mut add = |route: &str, rules: [(ProfileType, AccessRule); 4]| {
            entries.push(MatrixEntry {
                pattern: RoutePattern::parse(route),
                rules: rules.into_iter().collect(),
            });
        };

        // Generic entry point: everyone is let in and forwarded to their
        // role home.
        add("/", [
            (Superadmin, allow_landing("/dashboard/admin")),
            (Admin, allow_landing("/dashboard/admin")),
            (Agriculteur, allow_landing("/products/myproducts")),
            (Acheteur, allow_landing("/marketplace")),
        ]);

        let marketplace = |profile: ProfileType| match access.marketplace {
            MarketplaceAccess::AllProfiles => allow(),
            MarketplaceAccess::BuyersOnly if profile == Acheteur => allow(),
            MarketplaceAccess::BuyersOnly => deny(&denied),
        };
        add("/marketplace", [
            (Superadmin, marketplace(Superadmin)),
            (Admin, marketplace(Admin)),
            (Agriculteur, marketplace(Agriculteur)),
            (Acheteur, marketplace(Acheteur)),
        ]);

        // The buyer-facing catalog. Farmers are sent to their own listings
        // instead of browsing it.
        add("/products", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, deny("/products/myproducts")),
            (Acheteur, allow()),
        ]);
        add("/products/myproducts", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, deny(&denied)),
        ]);
        add("/products/add", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, deny(&denied)),
        ]);
        add("/products/edit/[id]", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, deny(&denied)),
        ]);

        add("/orders", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, allow()),
        ]);
        add("/orders/[id]", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, allow()),
        ]);
        add("/cart", [
            (Superadmin, deny(&denied)),
            (Admin, deny(&denied)),
            (Agriculteur, deny(&denied)),
            (Acheteur, allow()),
        ]);

        // User management is the superadmin's distinguishing power.
        add("/users", [
            (Superadmin, allow()),
            (Admin, deny(&denied)),
            (Agriculteur, deny(&denied)),
            (Acheteur, deny(&denied)),
        ]);
        add("/users/add", [
            (Superadmin, allow()),
            (Admin, deny(&denied)),
            (Agriculteur, deny(&denied)),
            (Acheteur, deny(&denied)),
        ]);
        add("/users/edit/[id]", [
            (Superadmin, allow()),
            (Admin, deny(&denied)),
            (Agriculteur, deny(&denied)),
            (Acheteur, deny(&denied)),
        ]);

        add("/dashboard/admin", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, deny(&denied)),
            (Acheteur, deny(&denied)),
        ]);
        add("/profile", [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, allow()),
        ]);

        // The reset route must be reachable by degraded sessions of every
        // profile; the decision engine exempts it from the degraded check.
        add(&access.reset_route, [
            (Superadmin, allow()),
            (Admin, allow()),
            (Agriculteur, allow()),
            (Acheteur, allow()),
        ]);

        let mut public: Vec<String> = vec![
            access.login_route.clone(),
            "/auth/register".to_string(),
            "/auth/forgot-password".to_string(),
            "/auth/error".to_string(),
        ];
        public.dedup();
        let public = public.iter().map(|r| RoutePattern::parse(r)).collect();

        Self {
            entries,
            public,
            login_route: crate::access::route::normalize(&access.login_route),
            reset_route: crate::access::route::normalize(&access.reset_route),
        }
    }

    /// True if the route requires no session at all.
    pub fn is_public(&self, route: &str) -> bool {
        let path = crate::access::route::normalize(route);
        self.public
            .iter()
            .any(|p| p.match_strength(&path).is_some_and(|s| s.is_exact()))
    }

    /// Look up the rule for a route and profile.
    ///
    /// An exact route match wins over template matches; among template
    /// matches the longest registered prefix wins. Anything unknown, route
    /// or profile, resolves to default-deny toward the login route.
    pub fn lookup(&self, route: &str, profile: ProfileType) -> AccessRule {
        let path = crate::access::route::normalize(route);
        let best = self
            .entries
            .iter()
            .filter_map(|e| e.pattern.match_strength(&path).map(|s| (s, e)))
            .max_by_key(|(strength, _)| *strength);

        match best {
            Some((_, entry)) => entry.rules.get(&profile).cloned().unwrap_or_else(|| self.default_deny()),
            None => self.default_deny(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub fn reset_route(&self) -> &str {
        &self.reset_route
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &MatrixEntry> {
        self.entries.iter()
    }

    pub(crate) fn public_patterns(&self) -> impl Iterator<Item = &RoutePattern> {
        self.public.iter()
    }

    fn default_deny(&self) -> AccessRule {
        AccessRule {
            access: false,
            denied_redirect: Some(self.login_route.clone()),
            landing_redirect: None,
        }
    }
}
