//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can
//! be specified via `-f` flag or `FARMGATE_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FARMGATE_`
//!    override YAML values
//! 3. **BACKEND_URL** - Special case: overrides `backend.url` if set
//!
//! For nested config values, use double underscores in environment
//! variables. For example, `FARMGATE_AUTH__SESSION__COOKIE_NAME=fg_session`
//! sets the `auth.session.cookie_name` field.
//!
//! ## Access Policy
//!
//! The two historically diverging copies of the access matrix are resolved
//! here as explicit policy knobs:
//!
//! - `access.marketplace`: `buyers-only` (default) or `all-profiles`
//! - `access.denied_redirect`: `error-page` (default, `/auth/error`) or
//!   `root` (`/`)
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! FARMGATE_PORT=8080
//!
//! # Set backend connection (preferred method)
//! BACKEND_URL="https://api.marketplace.example.com"
//!
//! # Override nested values
//! FARMGATE_ACCESS__MARKETPLACE=all-profiles
//! FARMGATE_AUTH__SESSION__TIMEOUT=12h
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FARMGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment
/// variables. All fields have sensible defaults defined in the `Default`
/// implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Secret key for signing the session cookie (required)
    pub secret_key: Option<String>,
    /// Convenience override for `backend.url`, set via BACKEND_URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    /// Remote marketplace backend the gateway exchanges credentials with
    pub backend: BackendConfig,
    /// Session cookie configuration
    pub auth: AuthConfig,
    /// Route-access policy knobs
    pub access: AccessConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            secret_key: None,
            backend_url: None,
            backend: BackendConfig::default(),
            auth: AuthConfig::default(),
            access: AccessConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Remote backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the marketplace REST backend
    pub url: Url,
    /// Request timeout for backend calls
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost:8080").expect("default backend URL is valid"),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub session: SessionConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8 * 60 * 60), // one working day
            cookie_name: "farmgate_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "Strict".to_string(),
        }
    }
}

/// Marketplace visibility policy (the first axis on which the legacy rule
/// tables diverged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketplaceAccess {
    /// Every authenticated profile may browse the marketplace
    AllProfiles,
    /// Only buyers may browse the marketplace
    BuyersOnly,
}

/// Where denied navigations land (the second axis of divergence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeniedRedirect {
    /// Send denied users to `/auth/error`
    ErrorPage,
    /// Send denied users to the entry route `/`
    Root,
}

/// Route-access policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub marketplace: MarketplaceAccess,
    pub denied_redirect: DeniedRedirect,
    /// Where unauthenticated navigations are sent
    pub login_route: String,
    /// Where degraded (token-less) sessions are sent
    pub reset_route: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            marketplace: MarketplaceAccess::BuyersOnly,
            denied_redirect: DeniedRedirect::ErrorPage,
            login_route: "/auth/login".to_string(),
            reset_route: "/auth/reset-password".to_string(),
        }
    }
}

impl AccessConfig {
    /// The concrete route denied navigations are redirected to.
    pub fn denied_target(&self) -> &str {
        match self.denied_redirect {
            DeniedRedirect::ErrorPage => "/auth/error",
            DeniedRedirect::Root => "/",
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; "*" for any
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    /// Max age for preflight caching, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if backend_url is set, use it (preserving the configured timeout)
        if let Some(url) = config.backend_url.take() {
            config.backend.url = url
                .parse()
                .map_err(|e| figment::Error::from(format!("invalid BACKEND_URL: {e}")))?;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values.
            // FARMGATE_CONFIG belongs to clap (the config file path).
            .merge(Env::prefixed("FARMGATE_").ignore(&["config"]).split("__"))
            // Common BACKEND_URL pattern
            .merge(Env::raw().only(&["BACKEND_URL"]).map(|_| "backend_url".into()))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                 Please set FARMGATE_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        for (name, route) in [
            ("access.login_route", &self.access.login_route),
            ("access.reset_route", &self.access.reset_route),
        ] {
            if !route.starts_with('/') {
                return Err(Error::Internal {
                    operation: format!("Config validation: {name} must be an absolute path, got '{route}'"),
                });
            }
        }

        match self.auth.session.cookie_same_site.as_str() {
            "Strict" | "Lax" | "None" => {}
            other => {
                return Err(Error::Internal {
                    operation: format!("Config validation: auth.session.cookie_same_site must be Strict, Lax or None, got '{other}'"),
                });
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Expiry timestamp for a session created now.
    pub fn session_expiry(&self) -> chrono::DateTime<chrono::Utc> {
        let ttl = chrono::Duration::from_std(self.auth.session.timeout).unwrap_or_else(|_| chrono::Duration::days(365));
        chrono::Utc::now() + ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn test_args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_with_secret_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("FARMGATE_SECRET_KEY", "test-secret");

            let config = Config::load(&test_args("missing.yaml")).expect("defaults should load");
            assert_eq!(config.port, 3000);
            assert_eq!(config.access.marketplace, MarketplaceAccess::BuyersOnly);
            assert_eq!(config.access.denied_redirect, DeniedRedirect::ErrorPage);
            assert_eq!(config.auth.session.cookie_name, "farmgate_session");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
port: 4100
secret_key: file-secret
access:
  marketplace: all-profiles
  denied_redirect: root
auth:
  session:
    timeout: 30m
    cookie_name: fg_session
"#,
            )?;

            let config = Config::load(&test_args("config.yaml")).expect("yaml should load");
            assert_eq!(config.port, 4100);
            assert_eq!(config.access.marketplace, MarketplaceAccess::AllProfiles);
            assert_eq!(config.access.denied_target(), "/");
            assert_eq!(config.auth.session.timeout, Duration::from_secs(30 * 60));
            assert_eq!(config.auth.session.cookie_name, "fg_session");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "secret_key: file-secret\nport: 4100\n")?;
            jail.set_env("FARMGATE_PORT", "5200");
            jail.set_env("FARMGATE_ACCESS__MARKETPLACE", "all-profiles");

            let config = Config::load(&test_args("config.yaml")).expect("env override should load");
            assert_eq!(config.port, 5200);
            assert_eq!(config.access.marketplace, MarketplaceAccess::AllProfiles);
            Ok(())
        });
    }

    #[test]
    fn test_backend_url_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "secret_key: file-secret\n")?;
            jail.set_env("BACKEND_URL", "https://api.marketplace.example.com");

            let config = Config::load(&test_args("config.yaml")).expect("backend url override should load");
            assert_eq!(config.backend.url.as_str(), "https://api.marketplace.example.com/");
            Ok(())
        });
    }

    #[test]
    fn test_missing_secret_key_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "port: 4100\n")?;
            assert!(Config::load(&test_args("config.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_relative_login_route_rejected() {
        let config = Config {
            secret_key: Some("s".to_string()),
            access: AccessConfig {
                login_route: "auth/login".to_string(),
                ..AccessConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_same_site_rejected() {
        let mut config = Config {
            secret_key: Some("s".to_string()),
            ..Config::default()
        };
        config.auth.session.cookie_same_site = "Sideways".to_string();
        assert!(config.validate().is_err());
    }
}
