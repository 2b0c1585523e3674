//! # Notion OAuth Handlers
//!
//! Account linking against Notion's OAuth flow. The authorize endpoint mints
//! and persists a single-use state; the callback consumes it, exchanges the
//! code, fetches the bot user's owner email, finds-or-creates the local user,
//! seals the access token, and issues a JWT for subsequent API calls.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::issue_token;
use crate::error::{ApiError, validation_error};
use crate::handlers::users::UserResponse;
use crate::notion::{self, NotionError};
use crate::repositories::{NotionLink, OAuthStateRepository, UserRepository};
use crate::server::AppState;

/// Response carrying the Notion authorization URL and its state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeResponse {
    /// URL to redirect the user to
    pub authorization_url: String,
    /// Single-use state embedded in the URL, persisted server-side
    pub state: String,
}

/// Query parameters Notion redirects back with
#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    /// Authorization code to exchange for an access token
    pub code: Option<String>,
    /// State previously issued by the authorize endpoint
    pub state: Option<String>,
    /// Error code reported by Notion when authorization fails
    pub error: Option<String>,
}

/// Response after a completed OAuth callback
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallbackResponse {
    /// The linked user
    pub user: UserResponse,
    /// Human-readable confirmation
    #[schema(example = "Successfully connected to Notion")]
    pub message: String,
    /// Always `true` on this response
    pub success: bool,
    /// Bearer token for subsequent API calls
    pub jwt_token: String,
}

/// Start the Notion OAuth flow
#[utoipa::path(
    get,
    path = "/api/v1/auth/notion/authorize",
    responses(
        (status = 200, description = "Authorization URL generated", body = AuthorizeResponse),
        (status = 500, description = "Notion OAuth is not configured", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn notion_authorize(
    State(state): State<AppState>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    let repo = OAuthStateRepository::new(&state.db);

    // Opportunistic cleanup keeps the table from accumulating dead states.
    let removed = repo.cleanup_expired().await?;
    if removed > 0 {
        tracing::debug!(removed, "Expired OAuth states removed");
    }

    let oauth_state = notion::generate_state();
    repo.create(&oauth_state, state.config.oauth_state_ttl_secs)
        .await?;

    let authorization_url = state.notion.authorize_url(&oauth_state)?;

    Ok(Json(AuthorizeResponse {
        authorization_url,
        state: oauth_state,
    }))
}

/// Complete the Notion OAuth flow
#[utoipa::path(
    get,
    path = "/api/v1/auth/notion/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Workspace linked and JWT issued", body = CallbackResponse),
        (status = 400, description = "Provider error, missing code, or unknown/expired state", body = ApiError),
        (status = 502, description = "Token exchange or profile fetch failed", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn notion_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, ApiError> {
    if let Some(error) = query.error.filter(|value| !value.is_empty()) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "OAUTH_ERROR",
            "OAuth authorization failed",
        )
        .with_details(json!({ "error": error })));
    }

    let Some(code) = query.code.filter(|value| !value.is_empty()) else {
        return Err(validation_error(
            "Authorization code is required",
            json!({
                "field": "code",
                "message": "The callback must carry the authorization code from Notion"
            }),
        ));
    };

    // States are single-use: consumed here on first presentation, whether or
    // not the rest of the flow succeeds.
    let states = OAuthStateRepository::new(&state.db);
    let presented = query.state.unwrap_or_default();
    if presented.is_empty() || states.consume(&presented).await?.is_none() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_STATE",
            "Unknown or expired OAuth state",
        ));
    }

    let token = state.notion.exchange_code(&code).await?;
    let notion_user = state.notion.current_user(&token.access_token).await?;

    let email = notion_user.email().ok_or_else(|| {
        NotionError::UnexpectedPayload("user object carries no owner email".to_string())
    })?;

    let users = UserRepository::new(&state.db);
    let user = match users.find_by_email(email).await? {
        Some(existing) => existing,
        None => {
            let public_id = state.ids.new_id("user");
            users.create(&public_id, email, &notion_user.name).await?
        }
    };

    let sealed = state.cipher.seal(&token.access_token)?;
    let link = NotionLink {
        name: (!notion_user.name.is_empty()).then(|| notion_user.name.clone()),
        sealed_access_token: sealed,
        workspace_id: token.workspace_id.clone(),
        bot_id: token.bot_id.clone(),
        // Notion access tokens do not expire.
        token_expiry: None,
    };
    let user = users.link_notion_workspace(user.id, link).await?;

    let secret = state.config.jwt_secret.as_deref().unwrap_or_default();
    let jwt_token = issue_token(secret, user.id)?;

    tracing::info!(
        user = %user.public_id,
        workspace_id = user.notion_workspace_id.as_deref().unwrap_or_default(),
        "Notion workspace linked"
    );

    Ok(Json(CallbackResponse {
        user: UserResponse::from_model(&user),
        message: "Successfully connected to Notion".to_string(),
        success: true,
        jwt_token,
    }))
}
