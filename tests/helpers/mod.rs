//! Shared test setup: application state wired against a controllable
//! upstream base URL (usually a wiremock server).

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adcraft::app_state::AppState;
use adcraft::routes;
use adcraft::services::{
    assets::AssetsLoader, image_gen::ImageGenClient, prompt::LlmClient, screening::TermScreen,
    vision::VisionClient,
};
use adcraft::store::InMemoryJobStore;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;

/// Build application state with every upstream client pointed at
/// `upstream_base`. Single-attempt retries keep failure tests fast.
pub fn build_state(upstream_base: &str, outputs_dir: &Path) -> AppState {
    let timeout = Duration::from_secs(5);
    let llm = LlmClient::new(upstream_base, "test-token", timeout).unwrap();
    let generator = ImageGenClient::new(
        upstream_base,
        "test-token",
        timeout,
        Duration::from_millis(20),
        Duration::from_secs(5),
    )
    .unwrap();
    let vision = VisionClient::new(upstream_base, "test-token", timeout).unwrap();

    AppState::new(
        Arc::new(InMemoryJobStore::new()),
        llm,
        generator,
        vision,
        AssetsLoader::new(outputs_dir.join("assets")),
        TermScreen::with_defaults(),
        outputs_dir.to_path_buf(),
        1,
    )
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
