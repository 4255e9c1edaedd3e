//! Router-level API tests: validation, job visibility, and error codes.
//!
//! Upstream clients point at an unroutable address; nothing here depends on
//! a live model API.

mod helpers;

use adcraft::models::job::{AspectRatio, GenerationResult, ImageArtifact, Job};
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use helpers::{app, build_state, get_request, json_request, response_json};

const DEAD_UPSTREAM: &str = "http://127.0.0.1:9";

fn valid_brief() -> serde_json::Value {
    json!({
        "products": ["running shoes", "energy drink"],
        "target_market": "US",
        "target_audience": "young athletes"
    })
}

#[tokio::test]
async fn one_product_brief_is_rejected_without_creating_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(DEAD_UPSTREAM, dir.path());
    let app = app(state.clone());

    let body = json!({
        "products": ["running shoes"],
        "target_market": "US",
        "target_audience": "young athletes"
    });
    let response = app
        .oneshot(json_request("POST", "/api/generate", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = response_json(response).await;
    assert!(json["errors"]["products"]
        .as_str()
        .unwrap()
        .contains("at least 2"));

    // Validation fails fast: no job was created.
    assert!(state.store.list().await.is_empty());
}

#[tokio::test]
async fn blank_market_is_a_field_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(DEAD_UPSTREAM, dir.path());
    let app = app(state);

    let body = json!({
        "products": ["a", "b"],
        "target_market": "   ",
        "target_audience": "athletes"
    });
    let response = app
        .oneshot(json_request("POST", "/api/generate", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = response_json(response).await;
    assert!(json["errors"]["target_market"].is_string());
}

#[tokio::test]
async fn submitted_job_is_immediately_observable_as_pending() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(DEAD_UPSTREAM, dir.path());
    let app = app(state);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/generate", &valid_brief()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submit = response_json(response).await;
    assert_eq!(submit["status"], "pending");
    let job_id = submit["job_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/api/status/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = response_json(response).await;
    assert_eq!(status["job_id"], job_id.as_str());
    // The job may already be processing (or failed, with a dead upstream),
    // but never skips straight to completed.
    assert_ne!(status["status"], "completed");
}

#[tokio::test]
async fn status_for_unknown_job_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(build_state(DEAD_UPSTREAM, dir.path()));

    let uri = format!("/api/status/{}", Uuid::new_v4());
    let response = app
        .oneshot(get_request(&uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn images_conflict_until_job_completes() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(DEAD_UPSTREAM, dir.path());
    let app = app(state.clone());

    let pending = Job::pending(Uuid::new_v4());
    let pending_id = pending.id;
    state.store.put(pending).await;

    let mut processing = Job::pending(Uuid::new_v4());
    processing.start_processing();
    let processing_id = processing.id;
    state.store.put(processing).await;

    for id in [pending_id, processing_id] {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/images/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    let unknown = format!("/api/images/{}", Uuid::new_v4());
    let response = app
        .oneshot(get_request(&unknown))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completed_result_round_trips_with_artifact_order_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(DEAD_UPSTREAM, dir.path());
    let app = app(state.clone());

    let artifacts: Vec<ImageArtifact> = AspectRatio::ALL
        .into_iter()
        .map(|ratio| ImageArtifact {
            aspect_ratio: ratio,
            path: format!("trailcraft_x/{}/banner_us.png", ratio.dir_name()),
            url: format!("/outputs/trailcraft_x/{}/banner_us.png", ratio.dir_name()),
            size: Some([2048, 2048]),
        })
        .collect();
    let result = GenerationResult {
        brand_name: "TrailCraft".into(),
        campaign_message: "Run Further".into(),
        translated_campaign_message: Some("Laufe Weiter".into()),
        images: artifacts.clone(),
        output_dir: "trailcraft_x".into(),
    };

    let mut job = Job::pending(Uuid::new_v4());
    job.start_processing();
    job.complete(result.clone());
    let job_id = job.id;
    state.store.put(job).await;

    let response = app
        .oneshot(get_request(&format!("/api/images/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: GenerationResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed, result);
    assert_eq!(parsed.images, artifacts);
}

#[tokio::test]
async fn compliance_check_requires_brand_name_and_image_paths() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(build_state(DEAD_UPSTREAM, dir.path()));

    // Blank brand name: rejected before any file or upstream access.
    let body = json!({ "image_paths": ["run/1_1/banner_us.png"], "brand_name": "  " });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/check-compliance", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("brand_name"));

    // Empty path list.
    let body = json!({ "image_paths": [], "brand_name": "TrailCraft" });
    let response = app
        .oneshot(json_request("POST", "/api/check-compliance", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compliance_check_reports_missing_images() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(build_state(DEAD_UPSTREAM, dir.path()));

    let body = json!({
        "image_paths": ["nope/1_1/banner_us.png"],
        "brand_name": "TrailCraft"
    });
    let response = app
        .oneshot(json_request("POST", "/api/check-compliance", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
