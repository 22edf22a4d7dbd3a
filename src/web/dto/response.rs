//! Response DTOs for the Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::FileDescriptor;
use crate::file::DiskUsage;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// One stored file, as exposed to clients.
///
/// The internal blob name is deliberately absent; the id is the only
/// public handle.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    /// Server-generated file id.
    pub id: String,
    /// User-visible filename.
    pub name: String,
    /// File size in bytes.
    pub size: i64,
    /// MIME type as supplied at upload.
    pub mime_type: String,
    /// RFC 3339 upload timestamp.
    pub uploaded_at: String,
    /// Optional remark.
    pub remark: Option<String>,
}

impl From<FileDescriptor> for FileResponse {
    fn from(d: FileDescriptor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            size: d.size,
            mime_type: d.mime_type,
            uploaded_at: d.uploaded_at,
            remark: d.remark,
        }
    }
}

/// Response to starting a chunked upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadSessionResponse {
    /// Opaque id for the new upload session.
    pub upload_id: String,
}

/// Response to a bulk delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    /// Number of records actually removed.
    pub count: u64,
}

/// Capacity report for the content volume.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiskUsageResponse {
    /// Total volume capacity in bytes.
    pub total: u64,
    /// Used bytes.
    pub used: u64,
    /// Free bytes.
    pub free: u64,
    /// Used percentage of total.
    pub percent: f64,
}

impl From<DiskUsage> for DiskUsageResponse {
    fn from(u: DiskUsage) -> Self {
        Self {
            total: u.total,
            used: u.used,
            free: u.free,
            percent: u.percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_response_hides_stored_name() {
        let descriptor = FileDescriptor::new("doc.pdf", 42, "application/pdf");
        let response = FileResponse::from(descriptor.clone());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], descriptor.id);
        assert_eq!(json["name"], "doc.pdf");
        assert_eq!(json["size"], 42);
        assert!(json.get("stored_name").is_none());
        assert!(json.get("path").is_none());
    }

    #[test]
    fn test_api_response_wraps_data() {
        let json = serde_json::to_value(ApiResponse::new(vec![1, 2, 3])).unwrap();
        assert_eq!(json["data"][2], 3);
    }
}
