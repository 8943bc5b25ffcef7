//! End-to-end tests driving the HTTP router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use fraud_scoring_api::config::ArtifactsConfig;
use fraud_scoring_api::metrics::ServiceMetrics;
use fraud_scoring_api::{router, AppState, ArtifactLoader, InferenceEngine};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn write_artifacts(dir: &Path) {
    fs::write(
        dir.join("scaler.json"),
        json!({
            "feature_names_in": ["age", "claim_amount", "policy_type", "region"],
            "kind": "standard",
            "mean": [40.0, 3000.0, 1.0, 0.5],
            "scale": [12.0, 2500.0, 0.8, 0.5]
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.join("label_encoders.json"),
        json!({
            "policy_type": {"classes": ["auto", "home", "life"]},
            "region": {"classes": ["north", "south"]}
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.join("fraud_detection_model.json"),
        json!({
            "kind": "logistic_regression",
            "coefficients": [-0.4, 1.8, 0.2, 0.1],
            "intercept": -0.5
        })
        .to_string(),
    )
    .unwrap();
}

fn app_from_dir(dir: &Path) -> (Router, Arc<ServiceMetrics>) {
    let loader = ArtifactLoader::new(&ArtifactsConfig {
        dir: Some(dir.to_path_buf()),
        ..ArtifactsConfig::default()
    });
    let engine = loader.load_or_degrade().map(InferenceEngine::new);
    let metrics = Arc::new(ServiceMetrics::new());
    (router(AppState::new(engine, metrics.clone()), true), metrics)
}

fn loaded_app() -> (Router, Arc<ServiceMetrics>, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    write_artifacts(tmp.path());
    let (app, metrics) = app_from_dir(tmp.path());
    (app, metrics, tmp)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_predict(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn assert_consistent_verdict(verdict: &Value) {
    let obj = verdict.as_object().unwrap();
    assert_eq!(obj.len(), 5, "unexpected fields: {:?}", obj.keys());

    let prediction = verdict["prediction"].as_u64().unwrap();
    let probability = verdict["probability"].as_f64().unwrap();
    let is_fraud = verdict["is_fraud"].as_bool().unwrap();
    let percentage = verdict["fraud_probability_percentage"].as_f64().unwrap();
    let status = verdict["status"].as_str().unwrap();

    assert!(prediction == 0 || prediction == 1);
    assert!((0.0..=1.0).contains(&probability));
    assert!((percentage - probability * 100.0).abs() < 1e-9);
    assert_eq!(is_fraud, prediction == 1);
    assert_eq!(status == "fraudulent", is_fraud);
    assert!(status == "fraudulent" || status == "genuine");
}

#[tokio::test]
async fn test_home() {
    let (app, _, _tmp) = loaded_app();
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Insurance Fraud Detection API is running!"})
    );
}

#[tokio::test]
async fn test_health_reports_schema() {
    let (app, _, _tmp) = loaded_app();
    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "healthy",
            "model_loaded": true,
            "expected_features": ["age", "claim_amount", "policy_type", "region"]
        })
    );
}

#[tokio::test]
async fn test_predict_with_missing_region() {
    let (app, metrics, _tmp) = loaded_app();
    let (status, body) = post_predict(
        &app,
        json!({"age": 30, "claim_amount": 5000, "policy_type": "auto"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_consistent_verdict(&body);
    assert_eq!(metrics.predictions.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_predict_is_idempotent() {
    let (app, _, _tmp) = loaded_app();
    let input = json!({"age": 61, "claim_amount": 900, "policy_type": "life", "region": "south"});

    let (_, first) = post_predict(&app, input.to_string()).await;
    let (_, second) = post_predict(&app, input.to_string()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unseen_category_still_scores() {
    let (app, _, _tmp) = loaded_app();

    let (status, unseen) = post_predict(
        &app,
        json!({"age": 30, "claim_amount": 5000, "policy_type": "spaceship"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_consistent_verdict(&unseen);

    let (_, first_class) = post_predict(
        &app,
        json!({"age": 30, "claim_amount": 5000, "policy_type": "auto"}).to_string(),
    )
    .await;
    assert_eq!(unseen, first_class);
}

#[tokio::test]
async fn test_nested_category_value_uses_first_class() {
    let (app, metrics, _tmp) = loaded_app();

    let (status, nested) = post_predict(
        &app,
        json!({"age": 30, "claim_amount": 5000, "policy_type": ["home"]}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_consistent_verdict(&nested);

    let (status, object) = post_predict(
        &app,
        json!({"age": 30, "claim_amount": 5000, "policy_type": {"kind": "home"}}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, first_class) = post_predict(
        &app,
        json!({"age": 30, "claim_amount": 5000, "policy_type": "auto"}).to_string(),
    )
    .await;
    assert_eq!(nested, first_class);
    assert_eq!(object, first_class);
    assert_eq!(metrics.failures.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_extra_and_missing_fields() {
    let (app, _, _tmp) = loaded_app();

    let (status, empty) = post_predict(&app, "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_consistent_verdict(&empty);

    let (status, extra) = post_predict(
        &app,
        json!({"claimant_name": "Alex", "incident": {"kind": "theft"}}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty, extra);
}

#[tokio::test]
async fn test_large_claim_is_fraudulent() {
    let (app, _, _tmp) = loaded_app();
    let (status, body) = post_predict(
        &app,
        json!({"age": 22, "claim_amount": 40000, "policy_type": "life", "region": "south"})
            .to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 1);
    assert_eq!(body["status"], "fraudulent");
}

#[tokio::test]
async fn test_bad_value_is_prediction_failure() {
    let (app, metrics, _tmp) = loaded_app();
    let (status, body) = post_predict(&app, json!({"claim_amount": "plenty"}).to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Prediction failed: "), "{}", error);
    assert!(error.contains("plenty"));
    assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);

    // the failure does not affect later requests
    let (status, _) = post_predict(&app, json!({"age": 30}).to_string()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_prediction_failure() {
    let (app, _, _tmp) = loaded_app();

    let (status, body) = post_predict(&app, "{\"age\": ").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Prediction failed: "));

    let (status, body) = post_predict(&app, "[1, 2]").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("JSON object"));
}

#[tokio::test]
async fn test_degraded_service() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, metrics) = app_from_dir(tmp.path());

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["expected_features"], json!([]));

    let (status, body) = post_predict(&app, json!({"age": 30}).to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Models not loaded properly"}));
    assert_eq!(metrics.rejected_degraded.load(Ordering::Relaxed), 1);

    let (status, _) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_mismatched_artifacts_degrade() {
    let tmp = tempfile::tempdir().unwrap();
    write_artifacts(tmp.path());
    fs::write(
        tmp.path().join("fraud_detection_model.json"),
        json!({"kind": "logistic_regression", "coefficients": [1.0, 2.0], "intercept": 0.0})
            .to_string(),
    )
    .unwrap();

    let (app, _) = app_from_dir(tmp.path());
    let (_, body) = get(&app, "/health").await;
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_degraded_check_precedes_body_parsing() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _) = app_from_dir(tmp.path());

    let (status, body) = post_predict(&app, "not json at all").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Models not loaded properly");
}
