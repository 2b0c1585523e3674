//! End-to-end webhook ingestion tests over the assembled router: signature
//! checks, handshake acknowledgement, and delivery to bus subscribers.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hmac::{Hmac, Mac};
use notion_bridge::{
    bus::{EventPublisher, spawn_webhook_worker},
    config::AppConfig,
    db::{init_pool, run_migrations},
    handlers::webhooks::SIGNATURE_HEADER,
    server::{AppState, create_app, create_test_app_state},
};
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const SECRET: &str = "pipeline-test-secret";

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

async fn pipeline_state(webhook_secret: Option<&str>) -> AppState {
    let config = AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        webhook_secret: webhook_secret.map(str::to_string),
        ..AppConfig::default()
    };

    let db = init_pool(&config).await.expect("test db");
    run_migrations(&db).await.expect("migrations apply");
    create_test_app_state(config, db)
}

fn post_webhook(body: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/notion")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn signed_notification_flows_to_a_subscriber() {
    let state = pipeline_state(Some(SECRET)).await;
    let mut sub = state.bus.subscribe(&state.config.webhook_topic);
    let app = create_app(state);

    let body = br#"{"type":"page.content_updated","entity":{"id":"page-1"}}"#;
    let response = app
        .oneshot(post_webhook(body, Some(&sign(SECRET, body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack = response_json(response).await;
    assert_eq!(ack["message"], "Webhook event processed successfully");

    let message = sub.try_recv().expect("not closed").expect("one message");
    assert!(message.id.starts_with("webhook_"));

    let envelope: Value = serde_json::from_slice(&message.payload).unwrap();
    let original: Value = serde_json::from_slice(body).unwrap();
    assert_eq!(envelope["payload"], original);
}

#[tokio::test]
async fn handshake_round_trips_the_token_without_publishing() {
    let state = pipeline_state(Some(SECRET)).await;
    let mut sub = state.bus.subscribe(&state.config.webhook_topic);
    let app = create_app(state);

    let body = br#"{"verification_token":"tok-e2e-1"}"#;
    let response = app
        .oneshot(post_webhook(body, Some(&sign(SECRET, body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack = response_json(response).await;
    assert_eq!(ack["token"], "tok-e2e-1");

    assert_eq!(sub.try_recv().expect("not closed"), None);
}

#[tokio::test]
async fn tampered_body_is_rejected_end_to_end() {
    let state = pipeline_state(Some(SECRET)).await;
    let mut sub = state.bus.subscribe(&state.config.webhook_topic);
    let app = create_app(state);

    // Signature computed over different bytes than the delivered body.
    let signature = sign(SECRET, br#"{"type":"page.created"}"#);
    let response = app
        .oneshot(post_webhook(br#"{"type":"page.deleted"}"#, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = response_json(response).await;
    assert_eq!(error["code"], "SIGNATURE_MISMATCH");

    assert_eq!(sub.try_recv().expect("not closed"), None);
}

#[tokio::test]
async fn background_worker_consumes_published_events() {
    let state = pipeline_state(Some(SECRET)).await;
    let shutdown = CancellationToken::new();
    let worker = spawn_webhook_worker(
        Arc::clone(&state.bus),
        &state.config.webhook_topic,
        shutdown.clone(),
    );
    let bus = Arc::clone(&state.bus);
    let app = create_app(state);

    // The worker's subscription is the only consumer; the publish still lands.
    let body = br#"{"type":"page.created","entity":{"id":"page-9"}}"#;
    let response = app
        .oneshot(post_webhook(body, Some(&sign(SECRET, body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bus.messages_published(), 1);

    shutdown.cancel();
    worker.await.expect("worker task completes");
}

#[tokio::test]
async fn concurrent_deliveries_are_all_accepted() {
    let state = pipeline_state(Some(SECRET)).await;
    let mut sub = state.bus.subscribe(&state.config.webhook_topic);
    let app = create_app(state);

    let bodies: Vec<Vec<u8>> = (0..4)
        .map(|n| format!(r#"{{"type":"page.created","entity":{{"id":"page-{}"}}}}"#, n).into_bytes())
        .collect();

    let (a, b, c, d) = tokio::join!(
        app.clone().oneshot(post_webhook(&bodies[0], Some(&sign(SECRET, &bodies[0])))),
        app.clone().oneshot(post_webhook(&bodies[1], Some(&sign(SECRET, &bodies[1])))),
        app.clone().oneshot(post_webhook(&bodies[2], Some(&sign(SECRET, &bodies[2])))),
        app.oneshot(post_webhook(&bodies[3], Some(&sign(SECRET, &bodies[3])))),
    );
    for response in [a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()] {
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mut ids = Vec::new();
    let mut payloads = Vec::new();
    while let Some(message) = sub.try_recv().expect("not closed") {
        ids.push(message.id.clone());
        let envelope: Value = serde_json::from_slice(&message.payload).unwrap();
        payloads.push(envelope["payload"].clone());
    }

    assert_eq!(ids.len(), 4);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4, "every event gets its own id");

    for body in &bodies {
        let original: Value = serde_json::from_slice(body).unwrap();
        assert!(payloads.contains(&original));
    }
}

#[tokio::test]
async fn missing_secret_rejects_handshake_and_notification_alike() {
    let state = pipeline_state(None).await;
    let app = create_app(state);

    let handshake = br#"{"verification_token":"tok-1"}"#;
    let response = app
        .clone()
        .oneshot(post_webhook(handshake, Some(&sign("anything", handshake))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = response_json(response).await;
    assert_eq!(error["code"], "CONFIGURATION_MISSING");

    let notification = br#"{"type":"page.created"}"#;
    let response = app
        .oneshot(post_webhook(notification, Some(&sign("anything", notification))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unsigned_request_never_reaches_the_bus() {
    let state = pipeline_state(Some(SECRET)).await;
    let mut sub = state.bus.subscribe(&state.config.webhook_topic);
    let app = create_app(state);

    let response = app
        .oneshot(post_webhook(br#"{"type":"page.created"}"#, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = response_json(response).await;
    assert_eq!(error["code"], "MISSING_SIGNATURE");
    assert_eq!(sub.try_recv().expect("not closed"), None);
}
