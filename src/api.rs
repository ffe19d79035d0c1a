//! HTTP API: одиночное и пакетное предсказание, выдача файлов с результатами

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::error::PipelineError;
use crate::pipeline::PredictionPipeline;
use crate::results::{ResultHandle, ResultStore};
use crate::types::{BatchOutput, CustomerForm, PredictionOutput, ValidationError};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    pub results: Arc<ResultStore>,
    pub max_upload_bytes: usize,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(ValidationError),
    Prediction(PipelineError),
    NotFound(String),
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Prediction(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "message": message }),
            ),
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "success": false,
                    "message": "Invalid input",
                    "errors": e.errors,
                }),
            ),
            ApiError::Prediction(e) => {
                let status = if e.is_expected() {
                    tracing::warn!("Prediction error: {}", e);
                    StatusCode::UNPROCESSABLE_ENTITY
                } else {
                    tracing::error!("Prediction error: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (
                    status,
                    serde_json::json!({ "success": false, "message": e.user_message() }),
                )
            }
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "success": false, "message": message }),
            ),
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "success": false, "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/predict", post(predict))
        .route("/api/predict-file", post(predict_file))
        .route("/api/results/:handle", get(download_result))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Churn Prediction API (Rust)",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model_loaded": !state.pipeline.bundle().is_placeholder(),
    }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<CustomerForm>, JsonRejection>,
) -> Result<Json<PredictionOutput>, ApiError> {
    let Json(form) = payload?;
    form.validate()?;
    tracing::info!(
        "Predict request: geography={}, card_type={}",
        form.record.geography,
        form.record.card_type
    );

    let prediction = state.pipeline.predict(&form.record)?;

    Ok(Json(PredictionOutput {
        success: true,
        customer_name: form.surname,
        prediction: prediction.label,
        probability: prediction.probability,
    }))
}

async fn predict_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchOutput>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload.ok_or_else(|| ApiError::BadRequest("No file part".to_string()))?;
    if file_name.is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }
    tracing::info!("Batch predict request: {} ({} bytes)", file_name, data.len());

    // CPU-нагрузка и запись файла - вне async-потоков
    let pipeline = Arc::clone(&state.pipeline);
    let results = Arc::clone(&state.results);
    let (handle, rows) = tokio::task::spawn_blocking(move || {
        let mut df = pipeline.predict_csv(&data)?;
        let handle = results.persist(&mut df)?;
        Ok::<_, PipelineError>((handle, df.height()))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(BatchOutput {
        success: true,
        download_url: format!("/api/results/{}", handle),
        result_file: handle.to_string(),
        rows,
    }))
}

async fn download_result(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let handle = ResultHandle::parse(&raw)
        .ok_or_else(|| ApiError::BadRequest("Invalid result handle".to_string()))?;

    let results = Arc::clone(&state.results);
    let lookup = handle.clone();
    let bytes = tokio::task::spawn_blocking(move || results.read(&lookup))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??
        .ok_or_else(|| ApiError::NotFound(format!("No result named {}", handle)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", handle),
            ),
        ],
        bytes,
    )
        .into_response())
}
