//! # farmgate: Access-Control Gateway for the Marketplace
//!
//! `farmgate` sits in front of the agricultural marketplace UI and owns the
//! route-access control for its four profiles: buyers (`ACHETEUR`), farmers
//! (`AGRICULTEUR`), administrators and super-administrators. It manages the
//! session lifecycle against the remote marketplace backend, consults a
//! single authored access matrix for every navigation, and enforces the
//! resulting verdicts at the edge, per page, and in menu construction.
//!
//! ## Overview
//!
//! The marketplace frontend historically enforced route access in three
//! places that disagreed with each other: an edge middleware that passed
//! everything through, a page wrapper that only checked that *some* login
//! existed, and ad-hoc role checks scattered through individual pages, fed
//! by two diverging copies of the rule table. This gateway collapses all of
//! that into one matrix and one decision function.
//!
//! ### Request Flow
//!
//! A navigation to route `R` first hits the **edge guard** (middleware
//! applied before path matching): it resolves the session from the signed
//! cookie and the server-side store, asks the decision engine for a verdict,
//! and short-circuits with a redirect on anything but an allow. The page
//! handler then runs behind the **page wrapper** extractor, which re-runs
//! the same decision. The two must agree by construction, since neither
//! carries rules of its own. Session state lives server-side and is only
//! ever replaced wholesale, so no guard can observe a half-updated session.
//!
//! The session API under `/api/auth/*` is exempt from the edge guard (a
//! session has to come from somewhere): `login` exchanges credentials with
//! the remote backend, `session` serves the snapshot client-side guards
//! consume (optionally re-fetching from the backend), and `reset-password`
//! clears the degraded token-less state a forced password reset leaves
//! behind. A 401 from the backend anywhere is treated as session death; an
//! unreachable backend is a retryable 503 and never a silent allow.
//!
//! ### Core Components
//!
//! The **access core** ([`access`]) holds the authored matrix and the pure
//! decision engine. The **auth layer** ([`auth`]) owns the session store,
//! the signed session cookie, the extractors and the edge middleware. The
//! **backend client** ([`backend`]) wraps the three calls the gateway makes
//! to the remote marketplace backend. The **API layer** ([`api`]) exposes
//! the session and navigation endpoints plus the guarded page shells.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use farmgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = farmgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     farmgate::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options, including the two
//! policy knobs (`access.marketplace`, `access.denied_redirect`) that
//! resolve the historical rule-table divergence.

pub mod access;
pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router, ServiceExt,
};
use bon::Builder;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    access::{AccessMatrix, DecisionEngine},
    auth::{middleware::route_guard_middleware, store::SessionStore},
    backend::BackendClient,
    openapi::ApiDoc,
};

pub use config::Config;
pub use types::{ProfileType, Session, SessionId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from environment/files
/// - `engine`: The decision engine over the authored access matrix,
///   assembled once at startup and immutable afterwards
/// - `sessions`: Server-side session store
/// - `backend`: Client for the remote marketplace backend
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<DecisionEngine>,
    pub sessions: Arc<SessionStore>,
    pub backend: Arc<BackendClient>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![axum::http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This constructs the complete Axum router with:
/// - Session API routes (login, logout, snapshot, password reset)
/// - The navigation-menu endpoint
/// - One page-shell route per access-matrix row (plus the public screens),
///   guarded by the page-level extractor
/// - API documentation at `/docs`
/// - CORS and tracing middleware
///
/// The edge guard is *not* part of the returned router: it is layered in
/// front of it (before path matching) by [`Application::serve`], so it also
/// covers navigations to routes the router does not know.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Session API routes (exempt from the edge guard so a session can be
    // established in the first place)
    let api_routes = Router::new()
        .route("/api/auth/login", post(api::handlers::auth::login))
        .route("/api/auth/logout", post(api::handlers::auth::logout))
        .route("/api/auth/session", get(api::handlers::auth::get_session))
        .route("/api/auth/reset-password", post(api::handlers::auth::reset_password))
        .route("/api/navigation", get(api::handlers::navigation::get_navigation))
        .with_state(state.clone());

    // One page shell per known route; the matrix is the routing table.
    let mut page_routes = Router::new();
    for route in state.engine.page_routes() {
        debug!("Registering page route {}", route);
        page_routes = page_routes.route(&route, get(api::handlers::pages::render_page));
    }
    let page_routes = page_routes.with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(api_routes)
        .merge(page_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;

    // Add tracing layer
    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] assembles the access matrix for the
///    configured policy, the session store, and the backend client
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests, with the edge guard layered before path matching
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting gateway with configuration: {:#?}", config);

        let engine = DecisionEngine::new(AccessMatrix::new(&config.access));
        let backend = BackendClient::new(&config.backend).map_err(|e| anyhow::anyhow!("Failed to create backend client: {e}"))?;

        let app_state = AppState::builder()
            .config(config.clone())
            .engine(Arc::new(engine))
            .sessions(Arc::new(SessionStore::new()))
            .backend(Arc::new(backend))
            .build();

        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            app_state,
            config,
        })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Gateway listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Apply the edge guard before path matching
        let middleware = from_fn_with_state(self.app_state, route_guard_middleware);
        let service = middleware.layer(self.router);

        // Run the server with graceful shutdown
        axum::serve(listener, service.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
