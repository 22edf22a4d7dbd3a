//! File handlers for the Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use utoipa;

use crate::web::dto::{
    ApiResponse, BulkDeleteRequest, BulkDeleteResponse, DiskUsageResponse, FileResponse,
    RenameRequest, UpdateRemarkRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// This function sanitizes the filename to prevent header injection
/// attacks and uses RFC 5987 encoding for non-ASCII filenames.
fn content_disposition_header(filename: &str) -> String {
    // Sanitize filename for the basic filename parameter (ASCII fallback)
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control()) // Remove control characters (CR, LF, etc.)
        .map(|c| match c {
            '"' => '_',  // Replace double quotes
            '\\' => '_', // Replace backslashes
            _ => c,
        })
        .collect();

    // For ASCII-only filenames, use simple format
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    // Use RFC 5987 encoding for non-ASCII or special characters
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// POST /api/files - Upload one or more files in one shot.
///
/// Request body: multipart/form-data with one or more "file" fields and
/// an optional "remark" field applied to every file.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Files uploaded", body = Vec<FileResponse>),
        (status = 400, description = "No file provided or invalid multipart data"),
        (status = 422, description = "Invalid filename or remark")
    )
)]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let mut files: Vec<(String, String, axum::body::Bytes)> = Vec::new();
    let mut remark: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("File field has no filename"))?;
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let content = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read file content: {}", e);
                    ApiError::bad_request("Failed to read file")
                })?;
                files.push((filename, mime_type, content));
            }
            "remark" => {
                remark = Some(field.text().await.map_err(|e| {
                    tracing::error!("Failed to read remark: {}", e);
                    ApiError::bad_request("Invalid remark")
                })?);
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No file provided"));
    }

    let service = state.service();
    let mut responses = Vec::with_capacity(files.len());
    for (filename, mime_type, content) in files {
        let descriptor = service
            .upload(&filename, &mime_type, remark.as_deref(), &content)
            .await?;
        responses.push(FileResponse::from(descriptor));
    }

    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/files - List all stored files.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "List of stored files", body = Vec<FileResponse>)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let files = state.service().list().await?;

    let responses = files.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/files/:id - Get file metadata.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let descriptor = state.service().get(&id).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(descriptor))))
}

/// GET /api/files/:id/download - Download a file.
///
/// Streams the blob; Content-Length is the stored size and the
/// Content-Disposition filename is the stored name.
#[utoipa::path(
    get,
    path = "/files/{id}/download",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let (descriptor, file) = state.service().download(&id).await?;

    // The stored type is authoritative; guess only when it is empty
    let content_type = if descriptor.mime_type.is_empty() {
        mime_guess::from_path(&descriptor.name)
            .first_or_octet_stream()
            .to_string()
    } else {
        descriptor.mime_type.clone()
    };

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&descriptor.name),
        )
        .header(header::CONTENT_LENGTH, descriptor.size)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// PATCH /api/files/:id/name - Rename a file.
#[utoipa::path(
    patch,
    path = "/files/{id}/name",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed", body = FileResponse),
        (status = 404, description = "File not found"),
        (status = 422, description = "Invalid filename")
    )
)]
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let descriptor = state.service().rename(&id, &request.name).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(descriptor))))
}

/// PATCH /api/files/:id/remark - Update a file's remark.
#[utoipa::path(
    patch,
    path = "/files/{id}/remark",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id")
    ),
    request_body = UpdateRemarkRequest,
    responses(
        (status = 200, description = "Remark updated", body = FileResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn update_remark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRemarkRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let descriptor = state
        .service()
        .update_remark(&id, request.remark.as_deref())
        .await?;
    Ok(Json(ApiResponse::new(FileResponse::from(descriptor))))
}

/// DELETE /api/files/:id - Delete a file.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id")
    ),
    responses(
        (status = 200, description = "File deleted"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.service().delete(&id).await?;
    Ok(Json(ApiResponse::new(())))
}

/// POST /api/files/bulk-delete - Delete several files at once.
///
/// Absent ids are silently ignored; the response carries the number of
/// records actually removed.
#[utoipa::path(
    post,
    path = "/files/bulk-delete",
    tag = "files",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Files deleted", body = BulkDeleteResponse)
    )
)]
pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<BulkDeleteResponse>>, ApiError> {
    let count = state.service().delete_many(&request.ids).await?;
    Ok(Json(ApiResponse::new(BulkDeleteResponse { count })))
}

/// GET /api/disk-usage - Report capacity of the content volume.
#[utoipa::path(
    get,
    path = "/disk-usage",
    tag = "files",
    responses(
        (status = 200, description = "Disk usage report", body = DiskUsageResponse)
    )
)]
pub async fn disk_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DiskUsageResponse>>, ApiError> {
    let usage = state.service().disk_usage();
    Ok(Json(ApiResponse::new(DiskUsageResponse::from(usage))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_header_simple_ascii() {
        let result = content_disposition_header("document.txt");
        assert_eq!(result, "attachment; filename=\"document.txt\"");
    }

    #[test]
    fn test_content_disposition_header_with_spaces() {
        let result = content_disposition_header("my document.txt");
        assert_eq!(result, "attachment; filename=\"my document.txt\"");
    }

    #[test]
    fn test_content_disposition_header_unicode() {
        let result = content_disposition_header("日本語ファイル.txt");
        assert!(result.starts_with("attachment; filename=\""));
        assert!(result.contains("filename*=UTF-8''"));
        assert!(result.contains("%E6%97%A5%E6%9C%AC%E8%AA%9E"));
    }

    #[test]
    fn test_content_disposition_header_double_quote() {
        let result = content_disposition_header("test\"file.txt");
        assert!(result.contains("filename=\"test_file.txt\""));
        assert!(result.contains("filename*=UTF-8''"));
        assert!(result.contains("%22"));
    }

    #[test]
    fn test_content_disposition_header_control_characters() {
        // Carriage return and line feed (header injection attempt)
        let result = content_disposition_header("test\r\nX-Injected: bad.txt");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
        assert!(result.starts_with("attachment; filename="));
    }

    #[test]
    fn test_content_disposition_header_backslash() {
        let result = content_disposition_header("test\\file.txt");
        assert!(result.contains("filename=\"test_file.txt\""));
        assert!(result.contains("filename*=UTF-8''"));
    }
}
