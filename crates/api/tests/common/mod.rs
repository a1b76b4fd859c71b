#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::Message;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use farmlink_api::config::ServerConfig;
use farmlink_api::relay::RelayHub;
use farmlink_api::router::build_app_router;
use farmlink_api::state::AppState;
use farmlink_api::ws::WsManager;
use farmlink_core::alerting::thresholds::ThresholdConfig;
use farmlink_core::protocol::{CommandTable, Frame};
use farmlink_events::{EventBus, PushConfig};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:8080` as CORS origin (matching the dev default),
/// a 30-second request timeout and no in-process simulator.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8080".to_string()],
        request_timeout_secs: 30,
        thresholds: ThresholdConfig::default(),
        push: PushConfig {
            endpoint: "http://127.0.0.1:9/alerts".to_string(),
            click_url: "http://localhost:8080".to_string(),
            notify_on_recovery: false,
        },
        simulator: None,
        mqtt: None,
    }
}

/// A hub over a fresh registry with the default command table.
pub fn test_hub(thresholds: ThresholdConfig) -> (Arc<RelayHub>, Arc<EventBus>) {
    let bus = Arc::new(EventBus::default());
    let hub = Arc::new(RelayHub::new(
        Arc::new(WsManager::new()),
        CommandTable::default(),
        thresholds,
        Arc::clone(&bus),
    ));
    (hub, bus)
}

/// Build the full application router with all middleware layers.
///
/// Goes through the same [`build_app_router`] as `main.rs`, so tests
/// exercise the production middleware stack.
pub fn build_test_app() -> (Router, Arc<RelayHub>) {
    let config = test_config();
    let (hub, _bus) = test_hub(config.thresholds);

    let state = AppState {
        config: Arc::new(config.clone()),
        hub: Arc::clone(&hub),
    };

    (build_app_router(state, &config), hub)
}

/// Issue a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("response body should be UTF-8")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    assert_ne!(response.status(), StatusCode::REQUEST_TIMEOUT);
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Pop the next queued frame for a peer, decoding it.
pub fn next_frame(rx: &mut mpsc::Receiver<Message>) -> Option<Frame> {
    match rx.try_recv().ok()? {
        Message::Text(text) => Some(Frame::decode(text.as_str()).expect("relayed frame decodes")),
        other => panic!("expected a text frame, got {other:?}"),
    }
}
