//! # Server Configuration
//!
//! This module contains the shared application state, router assembly, and
//! the HTTP entry point for the Notion Bridge API.

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::bus::{EventPublisher, InMemoryEventBus, spawn_webhook_worker};
use crate::config::AppConfig;
use crate::crypto::{CryptoKey, TokenCipher};
use crate::handlers;
use crate::ids::{IdSource, UuidIdSource};
use crate::notion::NotionClient;
use crate::telemetry::trace_context_middleware;
use crate::webhooks::WebhookService;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub bus: Arc<InMemoryEventBus>,
    pub webhooks: Arc<WebhookService>,
    pub notion: Arc<NotionClient>,
    pub cipher: Arc<TokenCipher>,
    pub ids: Arc<dyn IdSource>,
}

/// Assembles the shared state from configuration and an open database
/// connection.
pub fn build_state(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<AppState> {
    let config = Arc::new(config);

    let key_bytes = config
        .crypto_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("crypto key is required to assemble the server state"))?;
    let cipher = Arc::new(TokenCipher::new(CryptoKey::new(key_bytes)?));

    let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_bus_capacity));
    let ids: Arc<dyn IdSource> = Arc::new(UuidIdSource);
    let webhooks = Arc::new(WebhookService::new(
        &config,
        Arc::clone(&bus) as Arc<dyn EventPublisher>,
        Arc::clone(&ids),
    ));
    let notion = Arc::new(NotionClient::new(&config.notion));

    Ok(AppState {
        db,
        config,
        bus,
        webhooks,
        notion,
        cipher,
        ids,
    })
}

/// Builds state for tests, filling in key material and a JWT secret when the
/// provided config leaves them unset.
pub fn create_test_app_state(mut config: AppConfig, db: DatabaseConnection) -> AppState {
    if config.crypto_key.is_none() {
        config.crypto_key = Some(vec![0u8; 32]);
    }
    if config.jwt_secret.is_none() {
        config.jwt_secret = Some("test-jwt-secret".to_string());
    }
    build_state(config, db).expect("test state assembles")
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/webhooks/notion",
            post(handlers::webhooks::receive_notion_webhook),
        )
        .route("/api/v1/users", post(handlers::users::create_user))
        .route("/api/v1/users/{public_id}", get(handlers::users::get_user))
        .route(
            "/api/v1/users/by-email/{email}",
            get(handlers::users::get_user_by_email),
        )
        .route(
            "/api/v1/projects",
            post(handlers::projects::create_project).get(handlers::projects::list_projects),
        )
        .route(
            "/api/v1/auth/notion/authorize",
            get(handlers::oauth::notion_authorize),
        )
        .route(
            "/api/v1/auth/notion/callback",
            get(handlers::oauth::notion_callback),
        )
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    // Resolve the configured bind address before assembling anything else.
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();
    let topic = config.webhook_topic.clone();

    let state = build_state(config, db)?;

    // The worker subscribes before the listener accepts connections, so the
    // first notification already has a consumer on the topic.
    let shutdown = CancellationToken::new();
    let worker = spawn_webhook_worker(Arc::clone(&state.bus), &topic, shutdown.clone());

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, profile = %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    shutdown.cancel();
    let _ = worker.await;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::webhooks::receive_notion_webhook,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::get_user_by_email,
        crate::handlers::projects::create_project,
        crate::handlers::projects::list_projects,
        crate::handlers::oauth::notion_authorize,
        crate::handlers::oauth::notion_callback,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::HealthResponse,
            crate::error::ApiError,
            crate::error::ProviderErrorDetails,
            crate::handlers::webhooks::WebhookAck,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UserResponse,
            crate::handlers::projects::CreateProjectRequest,
            crate::handlers::projects::ProjectResponse,
            crate::handlers::projects::ProjectListResponse,
            crate::handlers::oauth::AuthorizeResponse,
            crate::handlers::oauth::CallbackResponse,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Notion Bridge API",
        description = "Receives Notion webhook deliveries and manages Notion OAuth connections",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer JWT scheme referenced by protected endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
