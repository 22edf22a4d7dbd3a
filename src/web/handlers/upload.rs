//! Chunked upload handlers for the Web API.
//!
//! Lifecycle: POST /uploads allocates a session, chunks are pushed in
//! any order (retries overwrite), and POST /uploads/:id/complete
//! assembles them into one stored file. DELETE /uploads/:id abandons
//! the session.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use utoipa;

use crate::web::dto::{ApiResponse, CompleteUploadRequest, FileResponse, UploadSessionResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/uploads - Start a chunked upload session.
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "uploads",
    responses(
        (status = 200, description = "Upload session created", body = UploadSessionResponse)
    )
)]
pub async fn initiate_upload(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<UploadSessionResponse>>, ApiError> {
    let upload_id = state.service().begin_chunked()?;
    Ok(Json(ApiResponse::new(UploadSessionResponse { upload_id })))
}

/// POST /api/uploads/:id/chunks/:index - Push one chunk.
///
/// Request body: multipart/form-data with a "chunk" field. Chunks may
/// arrive in any order; re-pushing an index overwrites it.
#[utoipa::path(
    post,
    path = "/uploads/{id}/chunks/{index}",
    tag = "uploads",
    params(
        ("id" = String, Path, description = "Upload session id"),
        ("index" = u32, Path, description = "Zero-based chunk index")
    ),
    responses(
        (status = 200, description = "Chunk stored"),
        (status = 400, description = "No chunk provided"),
        (status = 404, description = "Upload session not found")
    )
)]
pub async fn push_chunk(
    State(state): State<Arc<AppState>>,
    Path((upload_id, index)): Path<(String, u32)>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let mut content: Option<axum::body::Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() == Some("chunk") {
            content = Some(field.bytes().await.map_err(|e| {
                tracing::error!("Failed to read chunk content: {}", e);
                ApiError::bad_request("Failed to read chunk")
            })?);
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No chunk provided"))?;

    state.service().push_chunk(&upload_id, index, &content)?;

    Ok(Json(ApiResponse::new(())))
}

/// POST /api/uploads/:id/complete - Finalize a chunked upload.
///
/// Assembles chunks 0..total_chunks in index order into one stored file
/// and registers its metadata. A missing chunk yields 409 and leaves
/// the staging area intact so the client can resend it and retry.
#[utoipa::path(
    post,
    path = "/uploads/{id}/complete",
    tag = "uploads",
    params(
        ("id" = String, Path, description = "Upload session id")
    ),
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Upload completed", body = FileResponse),
        (status = 404, description = "Upload session not found"),
        (status = 409, description = "A chunk is missing"),
        (status = 422, description = "Invalid filename or chunk count")
    )
)]
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<String>,
    Json(request): Json<CompleteUploadRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let mime_type = request
        .mime_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let descriptor = state
        .service()
        .complete_chunked(
            &upload_id,
            &request.name,
            mime_type,
            request.total_chunks,
            request.remark.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::new(FileResponse::from(descriptor))))
}

/// DELETE /api/uploads/:id - Abandon a chunked upload.
#[utoipa::path(
    delete,
    path = "/uploads/{id}",
    tag = "uploads",
    params(
        ("id" = String, Path, description = "Upload session id")
    ),
    responses(
        (status = 200, description = "Upload abandoned")
    )
)]
pub async fn abandon_upload(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.service().abandon(&upload_id)?;
    Ok(Json(ApiResponse::new(())))
}
