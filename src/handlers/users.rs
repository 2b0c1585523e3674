//! # Users API Handlers
//!
//! This module contains handlers for user creation and lookup endpoints.
//! Users are exposed under their prefixed public id; the internal UUID never
//! leaves the database layer.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};
use crate::models::user;
use crate::repositories::{RepositoryError, UserRepository};
use crate::server::AppState;

/// Request payload for creating a new user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Email address (unique across users)
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Display name
    #[schema(example = "Ada Lovelace")]
    pub name: String,
}

/// Response payload for user operations
///
/// The Notion access token is stored sealed and is never part of this
/// payload; integration status is reported through `has_notion_integration`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Public identifier of the user
    #[schema(example = "user_550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Email address
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Display name
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Timestamp when the user was created (ISO 8601)
    #[schema(example = "2025-01-15T10:30:00+00:00")]
    pub created_at: String,
    /// Timestamp when the user was last updated (ISO 8601)
    pub updated_at: String,
    /// Whether a Notion workspace is linked with an unexpired token
    pub has_notion_integration: bool,
    /// Workspace the Notion token is scoped to, when linked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_workspace_id: Option<String>,
    /// Expiry of the Notion token, when the provider reported one (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_token_expiry: Option<String>,
}

impl UserResponse {
    /// Builds the API payload for a stored user.
    pub fn from_model(user: &user::Model) -> Self {
        Self {
            id: user.public_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
            has_notion_integration: user.has_notion_integration(Utc::now().into()),
            notion_workspace_id: user.notion_workspace_id.clone(),
            notion_token_expiry: user.notion_token_expiry.map(|expiry| expiry.to_rfc3339()),
        }
    }
}

fn validate_create_request(request: &CreateUserRequest) -> Result<(), ApiError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(validation_error(
            "Invalid email address",
            json!({
                "field": "email",
                "message": "Email must be a non-empty address containing '@'"
            }),
        ));
    }

    if request.name.trim().is_empty() {
        return Err(validation_error(
            "Name is required and cannot be empty",
            json!({
                "field": "name",
                "message": "Name must be provided and cannot be empty"
            }),
        ));
    }

    Ok(())
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "A user with this email already exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(request) = payload?;
    validate_create_request(&request)?;

    let repo = UserRepository::new(&state.db);
    let public_id = state.ids.new_id("user");
    let user = repo
        .create(&public_id, request.email.trim(), request.name.trim())
        .await?;

    tracing::info!(user = %user.public_id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from_model(&user))))
}

/// Get a user by public id
#[utoipa::path(
    get,
    path = "/api/v1/users/{public_id}",
    params(
        ("public_id" = String, Path, description = "Public user identifier (`user_<uuid>`)")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 404, description = "User not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(&state.db);
    let user = repo
        .find_by_public_id(&public_id)
        .await?
        .ok_or(RepositoryError::NotFound { entity: "User" })?;

    Ok(Json(UserResponse::from_model(&user)))
}

/// Get a user by email address
#[utoipa::path(
    get,
    path = "/api/v1/users/by-email/{email}",
    params(
        ("email" = String, Path, description = "Email address of the user")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 404, description = "User not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(&state.db);
    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or(RepositoryError::NotFound { entity: "User" })?;

    Ok(Json(UserResponse::from_model(&user)))
}
