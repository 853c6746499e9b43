//! API routes for vista-web

mod attachments;

use crate::{AppState, ServeError, ViewOptions, render_view};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use vista_core::{AttachmentError, PageIdentity, ReportView};
use vista_proto::ReportBundle;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<AttachmentError> for ErrorResponse {
    fn from(e: AttachmentError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

pub(crate) fn attachment_error(e: AttachmentError) -> ApiError {
    let status = match e {
        AttachmentError::NotFound { .. } => StatusCode::NOT_FOUND,
        AttachmentError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!("Attachment unavailable: {}", e);
    (status, Json(ErrorResponse::from(e)))
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The report bundle as loaded
async fn get_report(State(state): State<AppState>) -> Result<Json<ReportBundle>, ApiError> {
    if state.test.is_none() {
        return Err(api_error(StatusCode::NOT_FOUND, "No test bound"));
    }
    Ok(Json(state.bundle.as_ref().clone()))
}

/// Document title and icon
async fn get_page(State(state): State<AppState>) -> Json<PageIdentity> {
    Json(PageIdentity::derive(state.test.as_deref()))
}

/// Rendered report view
async fn get_view(
    State(state): State<AppState>,
    Query(options): Query<ViewOptions>,
) -> Result<Json<ReportView>, ApiError> {
    render_view(&state, &options).await.map(Json).map_err(|e| {
        let status = match e {
            ServeError::Bind(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, e.to_string())
    })
}

/// Create API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(health))
        // Report and page metadata
        .route("/api/report", get(get_report))
        .route("/api/page", get(get_page))
        .route("/api/view", get(get_view))
        // Attachment retrieval
        .route(
            "/api/results/{result}/attachments/{name}",
            get(attachments::by_name),
        )
        .route(
            "/api/results/{result}/attachment-index/{index}",
            get(attachments::by_index),
        )
        .with_state(state)
}
