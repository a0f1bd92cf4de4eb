use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{CreateLinkRequest, LinkRecord};
use crate::registry::{validate_url, SharedRegistry, ValidationError};

pub struct AppState {
    pub registry: SharedRegistry,
    pub recent_limit: usize,
    /// Awaited before the registry is locked for a create
    pub create_delay: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    pub removed: Vec<LinkRecord>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn validation_error(err: ValidationError) -> ApiError {
    let status = match err {
        ValidationError::AliasTaken(_) => StatusCode::CONFLICT,
        ValidationError::EmptyUrl
        | ValidationError::InvalidUrl(_)
        | ValidationError::ExpiryOutOfRange(_) => StatusCode::BAD_REQUEST,
    };
    error(status, err.to_string())
}

/// Create a new shortened link
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkRecord>), ApiError> {
    validate_url(&payload.url).map_err(validation_error)?;
    if !state.create_delay.is_zero() {
        tokio::time::sleep(state.create_delay).await;
    }

    // The alias check runs under the lock, after the delay
    let mut registry = state.registry.lock().await;
    let link = registry
        .create(&payload.url, payload.alias.as_deref(), payload.expiry_hours)
        .await
        .map_err(validation_error)?;

    tracing::info!(short_code = %link.short_code, "link created");
    Ok((StatusCode::CREATED, Json(link)))
}

/// List live links, most recent first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<LinkRecord>> {
    let limit = query.limit.unwrap_or(state.recent_limit);
    let links = state.registry.lock().await.list_active(limit);
    Json(links)
}

/// Get a link by code
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<LinkRecord>, ApiError> {
    let registry = state.registry.lock().await;
    registry
        .get(&code)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Link not found"))
}

/// Record a click on a live link
pub async fn click_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<LinkRecord>, ApiError> {
    let updated = state.registry.lock().await.track_click(&code).await;
    updated
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Link not found or expired"))
}

/// Delete a link
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let removed = state.registry.lock().await.remove(&code).await;
    match removed {
        Some(_) => Ok(Json(SuccessResponse {
            message: "Link deleted successfully".to_string(),
        })),
        None => Err(error(StatusCode::NOT_FOUND, "Link not found")),
    }
}

/// Remove expired links now instead of waiting for the sweeper
pub async fn sweep_links(State(state): State<Arc<AppState>>) -> Json<SweepResponse> {
    let removed = state.registry.lock().await.sweep_expired().await;
    Json(SweepResponse { removed })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
