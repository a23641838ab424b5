//! HTTP surface: `POST /predict` and `GET /health`

use crate::error::{PredictionError, ValidationError};
use crate::metrics::ServiceMetrics;
use crate::service::SentimentService;
use crate::types::{ErrorBody, HealthResponse, PredictionRequest};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// State shared by all handlers; immutable apart from the metric counters
pub struct AppState {
    pub service: SentimentService,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(service: SentimentService, metrics: Arc<ServiceMetrics>) -> Self {
        Self { service, metrics }
    }
}

/// Errors a request can end in
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Prediction(PredictionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(ValidationError::MalformedBody(details)) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid JSON body").with_details(details),
            ),
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, ErrorBody::new(e.to_string())),
            ApiError::Prediction(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Prediction failed").with_details(e.to_string()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(state)
}

async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    let request = match PredictionRequest::from_body(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Rejected prediction request");
            state.metrics.record_rejection();
            return ApiError::Validation(e).into_response();
        }
    };

    // Tokenization and inference are CPU-bound
    let worker_state = state.clone();
    let result = tokio::task::spawn_blocking(move || worker_state.service.predict(&request.text))
        .await
        .unwrap_or_else(|e| {
            Err(PredictionError::Aborted {
                reason: e.to_string(),
            })
        });

    match result {
        Ok(response) => {
            let processing_time = start_time.elapsed();
            state
                .metrics
                .record_prediction(processing_time, response.probability, response.sentiment);
            debug!(
                request_id = %request_id,
                sentiment = response.sentiment.as_str(),
                probability = response.probability,
                processing_time_us = processing_time.as_micros() as u64,
                "Prediction served"
            );
            Json(response).into_response()
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Error during prediction");
            state.metrics.record_failure();
            ApiError::Prediction(e).into_response()
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.service.model_name().to_string(),
        tokenizer_vocab_size: state.service.vocab_size(),
    })
}

/// Resolves when the process receives Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
