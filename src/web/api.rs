use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::info;

use super::responses::handle_result;
use super::AppState;
use crate::errors::AppError;
use crate::models::{ExecutionStarted, PipelineCreateRequest, StatusMap};

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let service = &state.pipeline_service;
    Json(json!({
        "status": "healthy",
        "pipelines": service.registry().len().await,
        "subscribers": service.broadcaster().subscriber_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// Pipelines API
pub async fn list_pipelines(State(state): State<AppState>) -> Response {
    let pipelines = state.pipeline_service.list_pipelines().await;
    handle_result(StatusCode::OK, Ok::<_, AppError>(pipelines))
}

pub async fn create_pipeline(
    State(state): State<AppState>,
    Json(payload): Json<PipelineCreateRequest>,
) -> Response {
    let result = state.pipeline_service.create_pipeline(payload).await;
    handle_result(StatusCode::CREATED, result)
}

pub async fn get_pipeline(Path(name): Path<String>, State(state): State<AppState>) -> Response {
    let result = state.pipeline_service.get_pipeline(&name).await;
    handle_result(StatusCode::OK, result)
}

/// Start an execution and return without waiting for it
pub async fn execute_pipeline(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let result = state
        .pipeline_service
        .execute_pipeline(&name)
        .await
        .map(|handle| {
            info!(
                pipeline = %name,
                execution_id = %handle.execution_id(),
                "Pipeline execution started"
            );
            ExecutionStarted {
                execution_id: handle.execution_id(),
                pipeline: handle.pipeline().to_string(),
                started_at: handle.started_at(),
            }
        });
    handle_result(StatusCode::ACCEPTED, result)
}

/// Bare stage → status map, without the response envelope
pub async fn get_pipeline_status(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatusMap>, AppError> {
    state.pipeline_service.get_status(&name).await.map(Json)
}
