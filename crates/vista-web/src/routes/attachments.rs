//! Attachment download and preview endpoints.
//!
//! Downloads are byte-exact: inline bodies are sent as stored and file
//! references are streamed from disk. The `Content-Disposition` header always
//! suggests the attachment's own name.

use super::{ApiError, api_error, attachment_error};
use crate::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use vista_core::{
    AttachmentRef, Preview, RetrievalRequest, RetrievalResponse, content_disposition,
    retrieval::lookup, retrieve,
};
use vista_proto::Attachment;

/// Query parameters shared by both attachment routes
#[derive(Debug, Default, Deserialize)]
pub struct AttachmentQuery {
    /// Switches to preview mode, reading at most this many bytes
    pub preview: Option<usize>,
}

/// Preview-mode response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub name: String,
    pub content_type: String,
    pub preview: Preview,
}

/// Download or preview an attachment by name
pub(super) async fn by_name(
    State(state): State<AppState>,
    Path((result, name)): Path<(usize, String)>,
    Query(query): Query<AttachmentQuery>,
) -> Result<Response, ApiError> {
    serve_attachment(&state, result, AttachmentRef::ByName(name), query).await
}

/// Download or preview an attachment by index
pub(super) async fn by_index(
    State(state): State<AppState>,
    Path((result, index)): Path<(usize, usize)>,
    Query(query): Query<AttachmentQuery>,
) -> Result<Response, ApiError> {
    serve_attachment(&state, result, AttachmentRef::ByIndex(index), query).await
}

async fn serve_attachment(
    state: &AppState,
    result: usize,
    attachment: AttachmentRef,
    query: AttachmentQuery,
) -> Result<Response, ApiError> {
    let test = state
        .test
        .as_deref()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No test bound"))?;

    if let Some(max_bytes) = query.preview {
        let found = lookup(test, result, &attachment)
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Attachment not found"))?;
        let preview = state
            .store
            .read_preview(found, max_bytes)
            .await
            .map_err(attachment_error)?;
        return Ok(Json(PreviewResponse {
            name: found.name().to_string(),
            content_type: found.content_type().to_string(),
            preview,
        })
        .into_response());
    }

    match retrieve(test, &RetrievalRequest::download(result, attachment)) {
        RetrievalResponse::Inline {
            name,
            content_type,
            bytes,
            ..
        } => Ok(download_response(&name, &content_type, None, Body::from(bytes))),
        RetrievalResponse::FileRedirect {
            name,
            content_type,
            path,
        } => {
            let file =
                Attachment::file(name.as_str(), path).with_content_type(content_type.as_str());
            let descriptor = state.store.resolve(&file).await.map_err(attachment_error)?;
            let stream = state
                .store
                .open_stream(&file)
                .await
                .map_err(attachment_error)?;
            Ok(download_response(
                &name,
                &content_type,
                descriptor.size_hint,
                Body::from_stream(stream),
            ))
        }
        RetrievalResponse::Unavailable => {
            Err(api_error(StatusCode::NOT_FOUND, "Attachment not found"))
        }
    }
}

fn download_response(name: &str, content_type: &str, length: Option<u64>, body: Body) -> Response {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    response
}
