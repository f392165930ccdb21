//! Common type definitions for the marketplace access-control core.
//!
//! This module defines:
//! - Type aliases for entity IDs
//! - [`ProfileType`]: the role assigned to a user account
//! - [`Session`]: the authenticated identity every guard consults
//!
//! # Profile Types
//!
//! Accounts carry exactly one profile type, assigned by the backend at login
//! and immutable for the lifetime of a session:
//!
//! - [`ProfileType::Superadmin`]: platform operators (user management)
//! - [`ProfileType::Admin`]: marketplace administrators (dashboards)
//! - [`ProfileType::Agriculteur`]: farmers selling produce
//! - [`ProfileType::Acheteur`]: buyers browsing the marketplace
//!
//! Older backend deployments emit the legacy names `USER` and `SUPPLIER`;
//! these are accepted as synonyms of `ACHETEUR` and `AGRICULTEUR` on
//! deserialization and never produced on serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type SessionId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Role assigned to a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileType {
    Superadmin,
    Admin,
    /// Farmer. Legacy deployments call this `SUPPLIER`.
    #[serde(alias = "SUPPLIER")]
    Agriculteur,
    /// Buyer. Legacy deployments call this `USER`.
    #[serde(alias = "USER")]
    Acheteur,
}

impl ProfileType {
    /// All profile types, in privilege order.
    pub const ALL: [ProfileType; 4] = [
        ProfileType::Superadmin,
        ProfileType::Admin,
        ProfileType::Agriculteur,
        ProfileType::Acheteur,
    ];
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileType::Superadmin => write!(f, "SUPERADMIN"),
            ProfileType::Admin => write!(f, "ADMIN"),
            ProfileType::Agriculteur => write!(f, "AGRICULTEUR"),
            ProfileType::Acheteur => write!(f, "ACHETEUR"),
        }
    }
}

/// Current authenticated identity.
///
/// Created by the login flow, read by every guard, and invalidated either
/// explicitly (logout) or implicitly (a 401 from the backend). A session
/// without an access token is "degraded": the account authenticated with a
/// temporary password and must complete the reset flow before it may go
/// anywhere else.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub profile_type: ProfileType,
    /// Backend bearer token. Absent immediately after a forced password
    /// reset, until the reset flow completes.
    pub access_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Authenticated but token-less: only the password-reset route is open.
    pub fn is_degraded(&self) -> bool {
        self.access_token.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_profile_aliases() {
        let buyer: ProfileType = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(buyer, ProfileType::Acheteur);

        let farmer: ProfileType = serde_json::from_str("\"SUPPLIER\"").unwrap();
        assert_eq!(farmer, ProfileType::Agriculteur);

        // Canonical names still round-trip
        for profile in ProfileType::ALL {
            let json = serde_json::to_string(&profile).unwrap();
            let back: ProfileType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, profile);
        }
    }

    #[test]
    fn test_legacy_names_never_serialized() {
        assert_eq!(serde_json::to_string(&ProfileType::Acheteur).unwrap(), "\"ACHETEUR\"");
        assert_eq!(serde_json::to_string(&ProfileType::Agriculteur).unwrap(), "\"AGRICULTEUR\"");
    }

    #[test]
    fn test_session_degraded_and_expired() {
        let mut session = Session {
            user_id: Uuid::new_v4(),
            email: "farmer@example.com".to_string(),
            profile_type: ProfileType::Agriculteur,
            access_token: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        assert!(session.is_degraded());
        assert!(!session.is_expired());

        session.access_token = Some("token".to_string());
        assert!(!session.is_degraded());

        session.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_abbrev_uuid() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&uuid), "550e8400");
    }
}
