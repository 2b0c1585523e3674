//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Notion Bridge
//! API.

use axum::response::Json;

use crate::models::{HealthResponse, ServiceInfo};

pub mod oauth;
pub mod projects;
pub mod users;
pub mod webhooks;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
