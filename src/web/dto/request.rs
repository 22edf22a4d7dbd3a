//! Request DTOs for the Web API.

use serde::Deserialize;
use utoipa::ToSchema;

/// Rename request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameRequest {
    /// New filename. If its extension is missing or differs from the
    /// current one, the current extension is appended.
    pub name: String,
}

/// Remark update request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRemarkRequest {
    /// New remark. Empty or absent clears the remark.
    #[serde(default)]
    pub remark: Option<String>,
}

/// Bulk delete request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    /// Ids of the files to delete. Absent ids are silently ignored.
    pub ids: Vec<String>,
}

/// Chunked upload completion request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteUploadRequest {
    /// User-visible filename including extension.
    pub name: String,
    /// Client-reported total size. Informational only; the stored size
    /// is the byte count actually assembled.
    #[serde(default)]
    pub size: Option<i64>,
    /// MIME type of the file.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Number of chunks that make up the file (indices 0..total_chunks).
    pub total_chunks: u32,
    /// Optional remark.
    #[serde(default)]
    pub remark: Option<String>,
}
