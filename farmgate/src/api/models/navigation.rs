//! API response models for navigation-menu construction.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::ProfileType;

/// The set of links the current profile may be shown.
///
/// Display data only: the menu filter never enforces anything, and the
/// routes listed here are exactly those the decision engine would allow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NavigationResponse {
    pub profile_type: ProfileType,
    pub routes: Vec<String>,
}
