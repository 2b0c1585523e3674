//! # Data Models
//!
//! This module contains all the data models used throughout the bridge API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod oauth_state;
pub mod project;
pub mod user;

pub use oauth_state::Entity as OAuthState;
pub use project::Entity as Project;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
    /// Short description of the service
    pub description: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "notion-bridge".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        }
    }
}

/// Liveness probe response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" while the service can answer requests
    #[schema(example = "ok")]
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
