//! HTTP surface: routes, shared state and the error-to-status boundary

use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::{InputRecord, Verdict};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn};
use uuid::Uuid;

pub const HOME_MESSAGE: &str = "Insurance Fraud Detection API is running!";
pub const MODELS_NOT_LOADED: &str = "Models not loaded properly";

/// State shared by every handler.
///
/// `engine` is `None` when the artifacts failed to load; the service then
/// stays up but refuses predictions.
#[derive(Clone)]
pub struct AppState {
    engine: Option<Arc<InferenceEngine>>,
    metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(engine: Option<InferenceEngine>, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            engine: engine.map(Arc::new),
            metrics,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub expected_features: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the router. CORS is opened to any origin when `cors` is set.
pub fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: HOME_MESSAGE.to_string(),
    })
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(engine) = state.engine.as_deref() else {
        state.metrics.record_degraded();
        warn!("Prediction refused, models not loaded");
        return error_response(MODELS_NOT_LOADED.to_string());
    };

    let request_id = Uuid::new_v4();
    info_span!("predict", %request_id).in_scope(|| {
        let start = Instant::now();

        match InputRecord::from_slice(&body).and_then(|record| engine.predict(record)) {
            Ok(verdict) => {
                state
                    .metrics
                    .record_prediction(start.elapsed(), verdict.probability, verdict.is_fraud);
                (StatusCode::OK, Json::<Verdict>(verdict)).into_response()
            }
            Err(e) => {
                state.metrics.record_failure(start.elapsed());
                error!(error = %e, "Prediction error");
                error_response(format!("Prediction failed: {}", e))
            }
        }
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let expected_features = state
        .engine
        .as_deref()
        .map(|engine| engine.feature_names().to_vec())
        .unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.is_loaded(),
        expected_features,
    })
}

fn error_response(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error }),
    )
        .into_response()
}
