pub mod analysis;
pub mod config;
pub mod report;
pub mod validation;

use analysis::{AnalysisError, PowerAnalysisResult, analyze};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use config::ServerConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validation::{ValidationError, read_fit_file, validate_upload};

pub fn build_app() -> Router {
    build_app_with(&ServerConfig::default())
}

pub fn build_app_with(config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/api/health", get(health))
        .route("/api/parse-fit", post(handle_parse_fit))
        .route(
            "/api/parse-fit-upload",
            post(handle_upload).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFitRequest {
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Body returned for every successful analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: PowerAnalysisResult,
    pub message: &'static str,
}

impl From<PowerAnalysisResult> for AnalysisResponse {
    fn from(result: PowerAnalysisResult) -> Self {
        let message = if result.has_power_data() {
            "Power data found"
        } else {
            "No power data in file"
        };
        Self {
            success: true,
            result,
            message,
        }
    }
}

/// Failures surfaced to HTTP clients as JSON error bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Request(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(ValidationError::MissingPath) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": ValidationError::MissingPath.to_string() })),
            )
                .into_response(),
            ApiError::Validation(ValidationError::EmptyBody) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No file data provided" })),
            )
                .into_response(),
            ApiError::Validation(error) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid FIT file or file does not exist",
                    "details": error.to_string(),
                })),
            )
                .into_response(),
            ApiError::Analysis(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to parse FIT file",
                    "details": error.to_string(),
                })),
            )
                .into_response(),
            ApiError::Request(rejection) => (
                rejection.status(),
                Json(json!({
                    "error": "Invalid request body",
                    "details": rejection.body_text(),
                })),
            )
                .into_response(),
        }
    }
}

async fn landing_page() -> Json<serde_json::Value> {
    Json(json!({ "message": "Power Balance API Server" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn handle_parse_fit(payload: Result<Json<ParseFitRequest>, JsonRejection>) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("parse_fit", %request_id);

    span.in_scope(|| -> Result<PowerAnalysisResult, ApiError> {
        let Json(request) = payload?;
        let file_path = request
            .file_path
            .filter(|path| !path.trim().is_empty())
            .ok_or(ValidationError::MissingPath)?;
        tracing::info!(file_path = %file_path, "analysing FIT file from disk");

        let bytes = read_fit_file(Path::new(&file_path))?;
        Ok(analyze(&bytes)?)
    })
    .map(|result| Json(AnalysisResponse::from(result)).into_response())
    .unwrap_or_else(render_api_error)
}

async fn handle_upload(body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("parse_fit_upload", %request_id, bytes = body.len());

    span.in_scope(|| -> Result<PowerAnalysisResult, ApiError> {
        validate_upload(&body)?;
        Ok(analyze(&body)?)
    })
    .map(|result| Json(AnalysisResponse::from(result)).into_response())
    .unwrap_or_else(render_api_error)
}

fn render_api_error(error: ApiError) -> Response {
    match &error {
        ApiError::Validation(err) => tracing::warn!("rejected FIT request: {err}"),
        ApiError::Request(err) => tracing::warn!("malformed parse request: {err}"),
        ApiError::Analysis(err) => tracing::error!("FIT analysis failed: {err}"),
    }
    error.into_response()
}
