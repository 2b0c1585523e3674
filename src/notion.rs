//! Notion API client
//!
//! Thin client over the Notion OAuth and user endpoints used by the
//! connection flow: building the authorization URL, exchanging the
//! authorization code for an access token, and identifying the user
//! behind a token.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

use crate::config::NotionConfig;

/// Notion client specific errors
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Notion OAuth credentials are not configured")]
    MissingCredentials,

    #[error("Notion API request failed with status {status}")]
    Api { status: u16, body: Option<String> },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected Notion response: {0}")]
    UnexpectedPayload(String),
}

/// Request body for the OAuth token exchange.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Response from the OAuth token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub bot_id: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_name: String,
    #[serde(default)]
    pub workspace_icon: Option<String>,
}

/// A Notion user as returned by `/v1/users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub person: Option<NotionPerson>,
    #[serde(default)]
    pub bot: Option<NotionBot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionPerson {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionBot {
    #[serde(default)]
    pub owner: Option<NotionBotOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionBotOwner {
    #[serde(default)]
    pub user: Option<Box<NotionUser>>,
}

impl NotionUser {
    /// Email address for this user.
    ///
    /// Integration tokens identify a bot rather than a person, so the
    /// person email on the user itself is tried first and the bot's
    /// owning user second. Returns `None` when neither carries one.
    pub fn email(&self) -> Option<&str> {
        if let Some(person) = &self.person
            && !person.email.is_empty()
        {
            return Some(&person.email);
        }

        self.bot
            .as_ref()
            .and_then(|bot| bot.owner.as_ref())
            .and_then(|owner| owner.user.as_deref())
            .and_then(|user| user.person.as_ref())
            .map(|person| person.email.as_str())
            .filter(|email| !email.is_empty())
    }
}

/// Notion API client
///
/// Holds one HTTP client for the process; the API base URL comes from
/// configuration so tests can point it at a mock server.
#[derive(Clone)]
pub struct NotionClient {
    http_client: reqwest::Client,
    api_base_url: String,
    api_version: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
}

impl NotionClient {
    fn build_http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Create a new Notion client from configuration
    pub fn new(config: &NotionConfig) -> Self {
        Self {
            http_client: Self::build_http_client(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    fn oauth_credentials(&self) -> Result<(&str, &str, &str), NotionError> {
        match (&self.client_id, &self.client_secret, &self.redirect_uri) {
            (Some(id), Some(secret), Some(redirect_uri)) => Ok((id, secret, redirect_uri)),
            _ => Err(NotionError::MissingCredentials),
        }
    }

    /// Build the Notion OAuth authorization URL for the given state
    pub fn authorize_url(&self, state: &str) -> Result<String, NotionError> {
        let (client_id, _, redirect_uri) = self.oauth_credentials()?;

        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("owner", "user");
        if !state.is_empty() {
            query.append_pair("state", state);
        }

        Ok(format!(
            "{}/v1/oauth/authorize?{}",
            self.api_base_url,
            query.finish()
        ))
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<NotionTokenResponse, NotionError> {
        let (client_id, client_secret, redirect_uri) = self.oauth_credentials()?;
        let credentials = BASE64.encode(format!("{}:{}", client_id, client_secret));

        debug!("Exchanging Notion authorization code for access token");
        let response = self
            .http_client
            .post(format!("{}/v1/oauth/token", self.api_base_url))
            .header("Authorization", format!("Basic {}", credentials))
            .header("Notion-Version", &self.api_version)
            .json(&TokenRequest {
                grant_type: "authorization_code",
                code,
                redirect_uri,
            })
            .send()
            .await?;

        if response.status().is_success() {
            let token_response: NotionTokenResponse = response.json().await?;
            Ok(token_response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.ok();
            Err(NotionError::Api { status, body })
        }
    }

    /// Fetch the user behind an access token from `/v1/users/me`
    pub async fn current_user(&self, access_token: &str) -> Result<NotionUser, NotionError> {
        let response = self
            .http_client
            .get(format!("{}/v1/users/me", self.api_base_url))
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Notion-Version", &self.api_version)
            .send()
            .await?;

        if response.status().is_success() {
            let user: NotionUser = response.json().await?;
            Ok(user)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.ok();
            Err(NotionError::Api { status, body })
        }
    }
}

/// Generate a cryptographically secure random state token
pub fn generate_state() -> String {
    use rand::Rng;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);

    base64_url::encode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_base(base: &str) -> NotionConfig {
        NotionConfig {
            client_id: Some("connector-id".to_string()),
            client_secret: Some("connector-secret".to_string()),
            redirect_uri: Some("https://bridge.example.com/callback".to_string()),
            api_base_url: base.to_string(),
            api_version: "2022-06-28".to_string(),
        }
    }

    #[test]
    fn authorize_url_includes_oauth_parameters() {
        let client = NotionClient::new(&config_with_base("https://api.notion.com"));

        let url = Url::parse(&client.authorize_url("state-abc").unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("api.notion.com"));
        assert_eq!(url.path(), "/v1/oauth/authorize");

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query.get("client_id").unwrap(), "connector-id");
        assert_eq!(
            query.get("redirect_uri").unwrap(),
            "https://bridge.example.com/callback"
        );
        assert_eq!(query.get("response_type").unwrap(), "code");
        assert_eq!(query.get("owner").unwrap(), "user");
        assert_eq!(query.get("state").unwrap(), "state-abc");
    }

    #[test]
    fn authorize_url_requires_credentials() {
        let client = NotionClient::new(&NotionConfig::default());

        let error = client.authorize_url("state-abc").unwrap_err();
        assert!(matches!(error, NotionError::MissingCredentials));
    }

    #[test]
    fn generate_state_is_url_safe_and_unique() {
        let first = generate_state();
        let second = generate_state();

        assert_eq!(first.len(), 43);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn exchange_code_sends_basic_auth_and_json_body() {
        let server = MockServer::start().await;
        let expected_auth = format!("Basic {}", BASE64.encode("connector-id:connector-secret"));

        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .and(header("authorization", expected_auth))
            .and(header("notion-version", "2022-06-28"))
            .and(body_json(serde_json::json!({
                "grant_type": "authorization_code",
                "code": "auth-code-123",
                "redirect_uri": "https://bridge.example.com/callback",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "secret-token",
                "token_type": "bearer",
                "bot_id": "bot-1",
                "workspace_id": "workspace-1",
                "workspace_name": "Acme",
                "workspace_icon": null,
            })))
            .mount(&server)
            .await;

        let client = NotionClient::new(&config_with_base(&server.uri()));
        let token = client.exchange_code("auth-code-123").await.unwrap();

        assert_eq!(token.access_token, "secret-token");
        assert_eq!(token.bot_id, "bot-1");
        assert_eq!(token.workspace_id, "workspace-1");
        assert_eq!(token.workspace_name, "Acme");
        assert_eq!(token.workspace_icon, None);
    }

    #[tokio::test]
    async fn exchange_code_surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;

        let client = NotionClient::new(&config_with_base(&server.uri()));
        let error = client.exchange_code("bad-code").await.unwrap_err();

        match error {
            NotionError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.unwrap().contains("invalid_grant"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn current_user_reads_person_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/users/me"))
            .and(header("authorization", "Bearer secret-token"))
            .and(header("notion-version", "2022-06-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "user",
                "id": "user-1",
                "type": "person",
                "name": "Ada Lovelace",
                "person": {"email": "ada@example.com"},
            })))
            .mount(&server)
            .await;

        let client = NotionClient::new(&config_with_base(&server.uri()));
        let user = client.current_user("secret-token").await.unwrap();

        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn current_user_falls_back_to_bot_owner_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "user",
                "id": "bot-user-1",
                "type": "bot",
                "name": "Bridge Integration",
                "bot": {
                    "owner": {
                        "type": "user",
                        "user": {
                            "object": "user",
                            "id": "user-2",
                            "name": "Grace Hopper",
                            "person": {"email": "grace@example.com"},
                        },
                    },
                },
            })))
            .mount(&server)
            .await;

        let client = NotionClient::new(&config_with_base(&server.uri()));
        let user = client.current_user("secret-token").await.unwrap();

        assert_eq!(user.email(), Some("grace@example.com"));
    }

    #[test]
    fn email_is_none_without_person_details() {
        let user: NotionUser = serde_json::from_value(serde_json::json!({
            "id": "bot-user-2",
            "name": "Workspace Bot",
            "bot": {"owner": {"type": "workspace"}},
        }))
        .unwrap();

        assert_eq!(user.email(), None);
    }
}
