//! # Projects API Handlers
//!
//! This module contains handlers for project creation and listing. Both
//! endpoints require a bearer token issued by the OAuth callback; projects
//! are always scoped to the authenticated user.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::error::{ApiError, validation_error};
use crate::models::project;
use crate::repositories::ProjectRepository;
use crate::server::AppState;

/// Request payload for creating a new project
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Notion database the project tracks
    #[schema(example = "d9824bdc-8445-4327-be8b-5b47500af6ce")]
    pub notion_database_id: String,
    /// Webhook secret Notion signs deliveries for this database with.
    /// Write-only: accepted here, never returned by any endpoint.
    pub notion_webhook_secret: String,
}

/// Response payload for project operations
///
/// The webhook secret is write-only and deliberately absent here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    /// Public identifier of the project
    #[schema(example = "project_550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Internal id of the owning user
    pub user_id: String,
    /// Notion database the project tracks
    pub notion_database_id: String,
    /// Timestamp when the project was created (ISO 8601)
    pub created_at: String,
    /// Timestamp when the project was last updated (ISO 8601)
    pub updated_at: String,
}

/// Response payload for listing projects
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectListResponse {
    /// Projects owned by the authenticated user
    pub projects: Vec<ProjectResponse>,
    /// Number of projects returned
    pub count: usize,
}

impl ProjectResponse {
    fn from_model(project: &project::Model) -> Self {
        Self {
            id: project.public_id.clone(),
            user_id: project.user_id.to_string(),
            notion_database_id: project.notion_database_id.clone(),
            created_at: project.created_at.to_rfc3339(),
            updated_at: project.updated_at.to_rfc3339(),
        }
    }
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    security(("bearer_auth" = [])),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created successfully", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let Json(request) = payload?;

    if request.notion_database_id.trim().is_empty() {
        return Err(validation_error(
            "Notion database id is required",
            json!({
                "field": "notion_database_id",
                "message": "Notion database id must be provided and cannot be empty"
            }),
        ));
    }
    if request.notion_webhook_secret.trim().is_empty() {
        return Err(validation_error(
            "Webhook secret is required",
            json!({
                "field": "notion_webhook_secret",
                "message": "Webhook secret must be provided and cannot be empty"
            }),
        ));
    }

    let repo = ProjectRepository::new(&state.db);
    let public_id = state.ids.new_id("project");
    let project = repo
        .create(
            &public_id,
            user_id,
            request.notion_database_id.trim(),
            &request.notion_webhook_secret,
        )
        .await?;

    tracing::info!(project = %project.public_id, "Project created");
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::from_model(&project)),
    ))
}

/// List projects owned by the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Projects retrieved successfully", body = ProjectListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let repo = ProjectRepository::new(&state.db);
    let projects = repo.list_by_user(user_id).await?;

    let projects: Vec<ProjectResponse> = projects.iter().map(ProjectResponse::from_model).collect();
    let count = projects.len();

    Ok(Json(ProjectListResponse { projects, count }))
}
