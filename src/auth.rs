//! # Authentication
//!
//! JWT issuing and verification for protected API endpoints. Tokens are
//! issued by the OAuth callback after a successful Notion link and carry the
//! user's internal id.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::server::AppState;

const TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried by issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Errors from token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing or malformed")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("failed to sign token: {0}")]
    TokenCreation(#[from] jsonwebtoken::errors::Error),
}

/// Issues an HS256 token for a user, valid for 24 hours.
pub fn issue_token(secret: &str, user_id: Uuid) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verifies a token's signature and expiry, returning its claims.
///
/// All verification failures collapse into [`AuthError::InvalidToken`]; the
/// caller never learns whether the signature or the expiry was at fault, and
/// the token itself is never echoed.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Extractor yielding the authenticated user's internal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);
        let secret = config.jwt_secret.as_deref().unwrap_or("");

        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let claims = verify_token(secret, token)?;

        Ok(CurrentUser(claims.user_id))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    const SECRET: &str = "test-jwt-secret";

    #[test]
    fn issued_token_verifies() {
        let user_id = Uuid::new_v4();
        let token = issue_token(SECRET, user_id).expect("token issued");

        let claims = verify_token(SECRET, &token).expect("token verifies");

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4()).expect("token issued");

        assert!(matches!(
            verify_token("other-secret", &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4()).expect("token issued");
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');

        assert!(matches!(
            verify_token(SECRET, &tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verify_token(SECRET, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[derive(Clone)]
    struct TestState {
        config: Arc<AppConfig>,
    }

    impl FromRef<TestState> for Arc<AppConfig> {
        fn from_ref(state: &TestState) -> Self {
            Arc::clone(&state.config)
        }
    }

    fn protected_app() -> Router {
        async fn handler(user: CurrentUser) -> String {
            user.0.to_string()
        }

        let config = Arc::new(AppConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..AppConfig::default()
        });

        Router::new()
            .route("/me", get(handler))
            .with_state(TestState { config })
    }

    #[tokio::test]
    async fn missing_header_returns_401() {
        let request = Request::builder().uri("/me").body(Body::empty()).unwrap();

        let response = protected_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_returns_401() {
        let request = Request::builder()
            .uri("/me")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = protected_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_returns_401() {
        let request = Request::builder()
            .uri("/me")
            .header("Authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();

        let response = protected_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_yields_user_id() {
        let user_id = Uuid::new_v4();
        let token = issue_token(SECRET, user_id).unwrap();
        let request = Request::builder()
            .uri("/me")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = protected_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());
    }
}
